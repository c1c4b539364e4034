//! Client engine for a broadcast-software control server.
//!
//! This crate connects to the server over a persistent text-message channel,
//! correlates replies to outstanding requests, performs the challenge/response
//! handshake, and fans server notifications out to typed subscribers.
//!
//! # Architecture
//!
//! - [`protocol`]: Wire envelopes (request, reply, notification)
//! - [`transport`]: Text-frame transports (WebSocket, in-process)
//! - [`correlation`]: Pending request tracking and reply matching
//! - [`auth`]: Challenge/response hashing
//! - [`dispatch`]: Envelope routing and the subscriber registry
//! - [`client`]: Session state machine and the public [`ObsClient`]
//! - [`requests`]: Typed wrappers for common requests
//! - [`error`]: Error and Result types
//!
//! # Example
//!
//! ```no_run
//! use obsws_rpc::{ClientOptions, EventKind, ObsClient, ObsEvent};
//!
//! # async fn example() -> Result<(), obsws_rpc::Error> {
//! let client = ObsClient::new(ClientOptions::default());
//! client.subscribe(EventKind::SceneSwitched, |event| {
//!     if let ObsEvent::SceneSwitched(switched) = event {
//!         println!("Now showing {}", switched.scene_name);
//!     }
//! });
//!
//! client.connect("ws://127.0.0.1:4444", Some("secret")).await?;
//! let version = client.get_version().await?;
//! println!("Server {}", version.obs_websocket_version);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod requests;
pub mod transport;

pub use client::{ClientOptions, DEFAULT_REQUEST_TIMEOUT, ObsClient, SessionState};
pub use correlation::{PendingRequest, PendingRequests};
pub use dispatch::{EventDispatcher, EventHandler, SubscriptionId, decode_event};
pub use error::{Error, Result};
pub use protocol::{Fields, Message, MessageId, Notification, Reply, Request, Status};
pub use transport::{
    Connector, MemoryConnector, MemoryPeer, Transport, TransportError, WebSocketConnector,
};

pub use obsws_types::{
    EventKind, Heartbeat, ObsEvent, OutputChange, OutputState, Scene, SceneItem, SceneList, StreamStatus,
    StreamingStatus, VersionInfo,
};
