//! Text-frame transports.
//!
//! A [`Connector`] opens a [`Transport`]: a sink of outgoing text frames and a
//! stream of incoming ones. The client never touches sockets directly, so the
//! WebSocket adapter and the in-process [`MemoryConnector`] are
//! interchangeable.

use std::pin::Pin;

use futures_util::future::{self, BoxFuture};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};

/// Outgoing half of a transport
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Incoming half of a transport. The stream ends when the peer goes away.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open bidirectional text-message channel
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Opens transports to an address
pub trait Connector: Send + Sync {
    fn connect(&self, address: &str) -> BoxFuture<'static, Result<Transport, TransportError>>;
}

/// Errors raised by a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[source] Box<tungstenite::Error>),
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed
            }
            other => Self::WebSocket(Box::new(other)),
        }
    }
}

/// WebSocket adapter built on tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self, address: &str) -> BoxFuture<'static, Result<Transport, TransportError>> {
        let address = address.to_string();
        Box::pin(async move {
            if !(address.starts_with("ws://") || address.starts_with("wss://")) {
                return Err(TransportError::InvalidAddress(address));
            }

            let (ws, _response) = tokio_tungstenite::connect_async(address.as_str()).await?;
            tracing::debug!("WebSocket connected to {}", address);

            let (sink, stream) = ws.split();
            let sink = sink
                .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(WsMessage::Text(text))))
                .sink_map_err(TransportError::from);
            let stream = stream.filter_map(|frame| future::ready(decode_frame(frame)));

            Ok(Transport {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        })
    }
}

/// Map a WebSocket frame to a text frame. Control frames are skipped; a close
/// frame surfaces as `ConnectionClosed`.
fn decode_frame(
    frame: Result<WsMessage, tungstenite::Error>,
) -> Option<Result<String, TransportError>> {
    match frame {
        Ok(WsMessage::Text(text)) => Some(Ok(text)),
        Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => Some(Ok(text)),
            Err(e) => {
                tracing::warn!("Dropping binary frame that is not UTF-8: {}", e);
                None
            }
        },
        Ok(WsMessage::Close(frame)) => {
            tracing::debug!("Peer sent close frame: {:?}", frame);
            Some(Err(TransportError::ConnectionClosed))
        }
        Ok(_) => None,
        Err(e) => Some(Err(e.into())),
    }
}

/// Server end of an in-process connection
#[derive(Debug)]
pub struct MemoryPeer {
    incoming: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::UnboundedSender<String>,
}

impl MemoryPeer {
    /// Next frame sent by the client, `None` once the client hung up.
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    /// Push a frame to the client.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionClosed` if the client is gone.
    pub fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.outgoing
            .send(text.into())
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Close the connection from the server side.
    pub fn close(self) {
        drop(self);
    }
}

/// In-process connector; every `connect` hands a fresh [`MemoryPeer`] to the
/// listener returned by [`MemoryConnector::new`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    listener: mpsc::UnboundedSender<(String, MemoryPeer)>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, MemoryPeer)>) {
        let (listener, accepted) = mpsc::unbounded_channel();
        (Self { listener }, accepted)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, address: &str) -> BoxFuture<'static, Result<Transport, TransportError>> {
        let (client_tx, server_rx) = mpsc::unbounded_channel::<String>();
        let (server_tx, client_rx) = mpsc::unbounded_channel::<String>();

        let peer = MemoryPeer {
            incoming: server_rx,
            outgoing: server_tx,
        };
        let accepted = self.listener.send((address.to_string(), peer)).is_ok();

        Box::pin(async move {
            if !accepted {
                return Err(TransportError::ConnectionClosed);
            }

            let sink = futures_util::sink::unfold(client_tx, |tx, text: String| async move {
                tx.send(text).map_err(|_| TransportError::ConnectionClosed)?;
                Ok::<_, TransportError>(tx)
            });
            let stream = futures_util::stream::unfold(client_rx, |mut rx| async move {
                rx.recv().await.map(|text| (Ok(text), rx))
            });

            Ok(Transport {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        })
    }
}
