//! obsws command-line client
//!
//! Connects to a broadcast-software control server and either watches its
//! notifications or issues a single request.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use obsws_rpc::{ClientOptions, EventKind, Fields, ObsClient, ObsEvent, auth};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "obsws")]
#[command(about = "Remote control for broadcast software over WebSocket")]
#[command(version)]
#[command(after_help = "\
Examples:
  obsws version                          Show server and plugin versions
  obsws scenes                           List scenes, marking the current one
  obsws switch \"Be Right Back\"           Switch program output to a scene
  obsws hide Webcam --scene Live         Hide a source
  obsws stream toggle                    Start or stop streaming
  obsws watch                            Print every notification as JSON
  obsws watch -e scene_switched          Print only scene switches
  obsws call GetSourcesList              Issue any request by name
  obsws call SetVolume '{\"source\": \"Mic\", \"volume\": 0.5}'

Settings are read from ~/.config/obsws/config.json:
  {\"address\": \"ws://127.0.0.1:4444\", \"password\": \"...\", \"requestTimeoutMs\": 10000}
Flags override the file.
")]
struct Cli {
    /// Server address (ws:// or wss://)
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Server password
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Config file to read instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Session(SessionCommand),

    /// Compute the authentication response offline
    AuthHash {
        password: String,
        salt: String,
        challenge: String,
    },
}

/// Commands that run against a live server
#[derive(Subcommand)]
enum SessionCommand {
    /// Print notifications as JSON lines until interrupted or disconnected
    Watch {
        /// Only print these event kinds (repeatable)
        #[arg(short, long = "event")]
        events: Vec<EventKind>,

        /// Ask the server for periodic heartbeats
        #[arg(long)]
        heartbeat: bool,
    },

    /// Send a raw request and print the reply fields
    Call {
        /// Request type, e.g. `GetSourcesList`
        request_type: String,

        /// Request fields as a JSON object
        fields: Option<String>,
    },

    /// Show server version information
    Version,

    /// List scenes
    Scenes,

    /// Switch program output to a scene
    Switch { scene: String },

    /// Show a source
    Show {
        source: String,
        /// Scene containing the source (defaults to the current scene)
        #[arg(long)]
        scene: Option<String>,
    },

    /// Hide a source
    Hide {
        source: String,
        /// Scene containing the source (defaults to the current scene)
        #[arg(long)]
        scene: Option<String>,
    },

    /// Control streaming
    Stream {
        #[arg(value_enum, default_value_t = OutputAction::Status)]
        action: OutputAction,
    },

    /// Start or stop recording
    Record,

    /// Show or toggle studio mode
    StudioMode {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputAction {
    Status,
    Start,
    Stop,
    Toggle,
}

/// Connection settings after merging the config file with flags
#[derive(Debug)]
struct Settings {
    address: String,
    password: Option<String>,
    request_timeout: Duration,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().or_else(Config::default_path);
        let config = match path {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };

        let config_timeout = config.request_timeout();
        Ok(Self {
            address: cli.address.clone().unwrap_or(config.address),
            password: cli.password.clone().or(config.password),
            request_timeout: cli
                .timeout_ms
                .map_or(config_timeout, Duration::from_millis),
        })
    }

    async fn connect(&self) -> Result<ObsClient> {
        let options = ClientOptions::default().with_request_timeout(self.request_timeout);
        let client = ObsClient::new(options);
        client
            .connect(&self.address, self.password.as_deref())
            .await
            .with_context(|| format!("Failed to connect to {}", self.address))?;
        Ok(client)
    }
}

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 if cfg!(debug_assertions) => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("obsws={default_level}")));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose > 0),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let command = match &cli.command {
        Commands::AuthHash {
            password,
            salt,
            challenge,
        } => {
            println!("{}", auth::auth_response(password, salt, challenge));
            return Ok(());
        }
        Commands::Session(command) => command,
    };

    let settings = Settings::resolve(&cli)?;
    let client = settings.connect().await?;

    let result = run_session(&client, command).await;

    client.disconnect().await;
    result
}

async fn run_session(client: &ObsClient, command: &SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Watch { events, heartbeat } => run_watch(client, events, *heartbeat).await,
        SessionCommand::Call {
            request_type,
            fields,
        } => run_call(client, request_type, fields.as_deref()).await,
        SessionCommand::Version => run_version(client).await,
        SessionCommand::Scenes => run_scenes(client).await,
        SessionCommand::Switch { scene } => client
            .set_current_scene(scene)
            .await
            .with_context(|| format!("Failed to switch to {scene}")),
        SessionCommand::Show { source, scene } => client
            .set_scene_item_visible(scene.as_deref(), source, true)
            .await
            .with_context(|| format!("Failed to show {source}")),
        SessionCommand::Hide { source, scene } => client
            .set_scene_item_visible(scene.as_deref(), source, false)
            .await
            .with_context(|| format!("Failed to hide {source}")),
        SessionCommand::Stream { action } => run_stream(client, *action).await,
        SessionCommand::Record => client
            .start_stop_recording()
            .await
            .context("Failed to toggle recording"),
        SessionCommand::StudioMode { toggle } => run_studio_mode(client, *toggle).await,
    }
}

async fn run_watch(client: &ObsClient, events: &[EventKind], heartbeat: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let forward = move |event: &ObsEvent| {
        let _ = tx.send(event.clone());
    };

    if events.is_empty() {
        client.subscribe_all(forward);
    } else {
        for kind in events {
            client.subscribe(*kind, forward.clone());
        }
        if !events.contains(&EventKind::Disconnected) {
            client.subscribe(EventKind::Disconnected, forward.clone());
        }
    }

    if heartbeat {
        client
            .set_heartbeat(true)
            .await
            .context("Failed to enable heartbeat")?;
    }

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if events.is_empty() || events.contains(&event.kind()) {
                    println!("{}", serde_json::to_string(&event)?);
                }
                if event == ObsEvent::Disconnected {
                    bail!("Connection closed by server");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn run_call(client: &ObsClient, request_type: &str, fields: Option<&str>) -> Result<()> {
    let fields = match fields {
        None => Fields::new(),
        Some(text) => match serde_json::from_str(text).context("Fields must be valid JSON")? {
            Value::Object(map) => map,
            other => bail!("Fields must be a JSON object, got {other}"),
        },
    };

    let reply = client
        .send(request_type, fields)
        .await
        .with_context(|| format!("{request_type} failed"))?;
    println!("{}", serde_json::to_string_pretty(&Value::Object(reply))?);
    Ok(())
}

async fn run_version(client: &ObsClient) -> Result<()> {
    let version = client.get_version().await.context("GetVersion failed")?;
    println!("obs-websocket {}", version.obs_websocket_version);
    println!("obs-studio    {}", version.obs_studio_version);
    println!(
        "requests      {}",
        version.available_requests().count()
    );
    Ok(())
}

async fn run_scenes(client: &ObsClient) -> Result<()> {
    let list = client.get_scene_list().await.context("GetSceneList failed")?;
    for scene in &list.scenes {
        let marker = if scene.name == list.current_scene {
            "*"
        } else {
            " "
        };
        println!("{marker} {} ({} sources)", scene.name, scene.sources.len());
    }
    Ok(())
}

async fn run_stream(client: &ObsClient, action: OutputAction) -> Result<()> {
    match action {
        OutputAction::Status => {
            let status = client
                .get_streaming_status()
                .await
                .context("GetStreamingStatus failed")?;
            println!(
                "streaming: {}{}",
                status.streaming,
                status
                    .stream_timecode
                    .map(|t| format!(" ({t})"))
                    .unwrap_or_default()
            );
            println!(
                "recording: {}{}",
                status.recording,
                status
                    .rec_timecode
                    .map(|t| format!(" ({t})"))
                    .unwrap_or_default()
            );
        }
        OutputAction::Start => client.start_streaming().await.context("StartStreaming failed")?,
        OutputAction::Stop => client.stop_streaming().await.context("StopStreaming failed")?,
        OutputAction::Toggle => client
            .start_stop_streaming()
            .await
            .context("StartStopStreaming failed")?,
    }
    Ok(())
}

async fn run_studio_mode(client: &ObsClient, toggle: bool) -> Result<()> {
    if toggle {
        client
            .toggle_studio_mode()
            .await
            .context("ToggleStudioMode failed")?;
    }
    let enabled = client
        .get_studio_mode_status()
        .await
        .context("GetStudioModeStatus failed")?;
    println!("studio mode: {}", if enabled { "on" } else { "off" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_event_filter() {
        let cli = Cli::parse_from(["obsws", "watch", "-e", "scene_switched", "-e", "heartbeat"]);
        match cli.command {
            Commands::Session(SessionCommand::Watch { events, heartbeat }) => {
                assert_eq!(events, vec![EventKind::SceneSwitched, EventKind::Heartbeat]);
                assert!(!heartbeat);
            }
            _ => panic!("Expected Watch"),
        }
    }

    #[test]
    fn test_unknown_event_kind_rejected() {
        assert!(Cli::try_parse_from(["obsws", "watch", "-e", "nope"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"address": "ws://file:4444", "password": "file", "requestTimeoutMs": 500}"#,
        )
        .unwrap();
        let config_arg = path.to_str().unwrap();

        let cli = Cli::parse_from(["obsws", "--config", config_arg, "version"]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.address, "ws://file:4444");
        assert_eq!(settings.password.as_deref(), Some("file"));
        assert_eq!(settings.request_timeout, Duration::from_millis(500));

        let cli = Cli::parse_from([
            "obsws",
            "--config",
            config_arg,
            "-a",
            "ws://flag:4455",
            "--timeout-ms",
            "50",
            "version",
        ]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.address, "ws://flag:4455");
        assert_eq!(settings.password.as_deref(), Some("file"));
        assert_eq!(settings.request_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["obsws", "switch", "Live", "-p", "secret", "-vv"]);
        assert_eq!(cli.password.as_deref(), Some("secret"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Session(SessionCommand::Switch { ref scene }) if scene == "Live"
        ));
    }

    #[test]
    fn test_auth_hash_is_offline_command() {
        let cli = Cli::parse_from(["obsws", "auth-hash", "hunter2", "xyz", "abc"]);
        match cli.command {
            Commands::AuthHash {
                password,
                salt,
                challenge,
            } => assert_eq!(
                auth::auth_response(&password, &salt, &challenge),
                "gggALJMRreGHuwQkY8IYrkendMLe5rKQb5ojN1UKqKQ="
            ),
            Commands::Session(_) => panic!("Expected AuthHash"),
        }
    }
}
