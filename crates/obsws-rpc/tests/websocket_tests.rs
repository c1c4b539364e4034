//! End-to-end tests over a real WebSocket on the loopback interface.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use obsws_rpc::{ClientOptions, Error, EventKind, ObsClient, ObsEvent, SessionState, auth};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

const PASSWORD: &str = "hunter2";
const SALT: &str = "xyz";
const CHALLENGE: &str = "abc";

/// Minimal server: requires auth, answers a few requests, then pushes one
/// notification and closes after `SetHeartbeat`.
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else {
                continue;
            };
            let request: Value = serde_json::from_str(&text).unwrap();
            let id = request["message-id"].clone();
            let reply = match request["request-type"].as_str().unwrap() {
                "GetAuthRequired" => json!({
                    "message-id": id, "status": "ok",
                    "authRequired": true, "challenge": CHALLENGE, "salt": SALT,
                }),
                "Authenticate" => {
                    if request["auth"] == auth::auth_response(PASSWORD, SALT, CHALLENGE) {
                        json!({"message-id": id, "status": "ok"})
                    } else {
                        json!({"message-id": id, "status": "error", "error": "Authentication Failed."})
                    }
                }
                "GetVersion" => json!({
                    "message-id": id, "status": "ok",
                    "version": 1.1,
                    "obs-websocket-version": "4.9.1",
                    "obs-studio-version": "27.0.0",
                    "available-requests": "GetVersion,GetAuthRequired,Authenticate",
                }),
                "SetHeartbeat" => {
                    ws.send(Message::Text(json!({"message-id": id, "status": "ok"}).to_string()))
                        .await
                        .unwrap();
                    ws.send(Message::Text(
                        json!({"update-type": "SwitchScenes", "scene-name": "Live", "sources": []})
                            .to_string(),
                    ))
                    .await
                    .unwrap();
                    ws.close(None).await.unwrap();
                    break;
                }
                other => json!({"message-id": id, "status": "error", "error": format!("invalid request type {other}")}),
            };
            ws.send(Message::Text(reply.to_string())).await.unwrap();
        }
    });

    address
}

#[tokio::test]
async fn test_websocket_session() {
    let address = spawn_server().await;
    let client = ObsClient::new(ClientOptions::default().with_request_timeout(Duration::from_secs(5)));

    let (tx, mut scenes) = mpsc::unbounded_channel();
    client.subscribe(EventKind::SceneSwitched, move |event| {
        if let ObsEvent::SceneSwitched(switched) = event {
            let _ = tx.send(switched.scene_name.clone());
        }
    });

    client.connect(&address, Some(PASSWORD)).await.unwrap();
    assert_eq!(client.state(), SessionState::Ready);

    let version = client.get_version().await.unwrap();
    assert_eq!(version.obs_websocket_version, "4.9.1");
    assert!(version.supports("GetVersion"));
    assert!(!version.supports("StartStreaming"));

    match client.send("Bogus", obsws_rpc::Fields::new()).await {
        Err(Error::Protocol(message)) => assert_eq!(message, "invalid request type Bogus"),
        other => panic!("Expected Protocol error, got {other:?}"),
    }

    let mut state = client.watch_state();
    client.set_heartbeat(true).await.unwrap();

    let scene = tokio::time::timeout(Duration::from_secs(5), scenes.recv())
        .await
        .unwrap();
    assert_eq!(scene.as_deref(), Some("Live"));

    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == SessionState::Disconnected),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_websocket_wrong_password() {
    let address = spawn_server().await;
    let client = ObsClient::default();

    match client.connect(&address, Some("nope")).await {
        Err(Error::AuthFailure(message)) => assert_eq!(message, "Authentication Failed."),
        other => panic!("Expected AuthFailure, got {other:?}"),
    }
    assert_eq!(client.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_websocket_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = ObsClient::default();
    assert!(matches!(
        client.connect(&address, None).await,
        Err(Error::Transport(_))
    ));
    assert_eq!(client.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_websocket_rejects_bad_scheme() {
    let client = ObsClient::default();
    assert!(matches!(
        client.connect("http://127.0.0.1:4444", None).await,
        Err(Error::Transport(obsws_rpc::TransportError::InvalidAddress(_)))
    ));
}
