//! Session lifecycle and the public client.
//!
//! A session moves `Disconnected -> Connecting -> Authenticating -> Ready` and
//! falls back to `Disconnected` on explicit disconnect, on a failed step, or
//! when the transport goes away.
//!
//! Every connection attempt gets a new epoch. The link (a writer task owning
//! the transport sink plus a reader task draining the stream) and the state
//! only change under the session lock, and only on behalf of the current
//! epoch. Teardown cancels every pending request under that same lock, so
//! the pending set is empty whenever there is no link. The lock is never held
//! across socket I/O.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use obsws_types::{EventKind, ObsEvent};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::auth::{self, AUTHENTICATE, AuthRequirement, AuthenticateParams, GET_AUTH_REQUIRED};
use crate::correlation::PendingRequests;
use crate::dispatch::{EventDispatcher, SubscriptionId};
use crate::error::{Error, Result};
use crate::protocol::{Fields, Message, Request};
use crate::transport::{Connector, FrameSink, FrameStream, Transport, TransportError, WebSocketConnector};

/// Default time to wait for a reply
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on waiting for the transport to flush its close
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-request timeout, counted from send time
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Which side of a link asked for it to be shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Caller,
    Reader,
    Writer,
}

/// Live connection: the outgoing frame queue and the two tasks serving it
struct Link {
    outgoing: mpsc::UnboundedSender<String>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl Link {
    /// Stop both tasks. The writer is given `CLOSE_TIMEOUT` to close the
    /// transport unless it is the one shutting down.
    async fn shutdown(mut self, origin: Origin) {
        let reader = self.reader.take();
        let writer = self.writer.take();
        drop(self);

        if origin != Origin::Reader
            && let Some(reader) = reader
        {
            reader.abort();
        }
        if origin != Origin::Writer
            && let Some(mut writer) = writer
            && tokio::time::timeout(CLOSE_TIMEOUT, &mut writer).await.is_err()
        {
            tracing::debug!("Timed out closing transport");
            writer.abort();
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        for task in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

struct Session {
    epoch: u64,
    link: Option<Link>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    pending: PendingRequests,
    dispatcher: EventDispatcher,
    session: Mutex<Session>,
    state: watch::Sender<SessionState>,
}

impl Inner {
    /// Record a state change; returns the signal to emit once locks are
    /// released.
    fn transition(&self, next: SessionState) -> Option<ObsEvent> {
        let previous = self.state.send_replace(next);
        if previous == next {
            return None;
        }
        tracing::debug!("Session state {} -> {}", previous, next);
        match next {
            SessionState::Disconnected => Some(ObsEvent::Disconnected),
            SessionState::Ready => Some(ObsEvent::Connected),
            SessionState::Connecting | SessionState::Authenticating => None,
        }
    }

    fn signal(&self, event: Option<ObsEvent>) {
        if let Some(event) = event {
            self.dispatcher.emit(&event);
        }
    }

    fn cancel_pending(&self) {
        let cancelled = self.pending.cancel_all();
        if cancelled > 0 {
            tracing::info!("Cancelled {} pending request(s)", cancelled);
        }
    }

    /// Start a new connection attempt, superseding any earlier one and
    /// dropping the current link. Returns the attempt's epoch.
    async fn begin(&self) -> u64 {
        let (epoch, previous, events) = {
            let mut session = self.session.lock().await;
            session.epoch += 1;
            let previous = session.link.take();
            self.cancel_pending();
            let events = [
                self.transition(SessionState::Disconnected),
                self.transition(SessionState::Connecting),
            ];
            (session.epoch, previous, events)
        };

        if let Some(previous) = previous {
            tracing::info!("Replacing previous session");
            previous.shutdown(Origin::Caller).await;
        }
        for event in events {
            self.signal(event);
        }
        epoch
    }

    /// Hand the transport to a reader and a writer task, unless `epoch` has
    /// been superseded in the meantime.
    async fn install(self: &Arc<Self>, epoch: u64, transport: Transport) -> bool {
        let event = {
            let mut session = self.session.lock().await;
            if session.epoch != epoch {
                return false;
            }

            let Transport { sink, stream } = transport;
            let (outgoing, queue) = mpsc::unbounded_channel();
            let reader = tokio::spawn(read_loop(Arc::downgrade(self), stream, epoch));
            let writer = tokio::spawn(write_loop(Arc::downgrade(self), sink, queue, epoch));
            session.link = Some(Link {
                outgoing,
                reader: Some(reader),
                writer: Some(writer),
            });
            self.transition(SessionState::Authenticating)
        };
        self.signal(event);
        true
    }

    /// Move to `next` if `epoch` is still current and its link is up.
    async fn advance(&self, epoch: u64, next: SessionState) -> bool {
        let event = {
            let session = self.session.lock().await;
            if session.epoch != epoch || session.link.is_none() {
                return false;
            }
            self.transition(next)
        };
        self.signal(event);
        true
    }

    /// Close the link, cancel every pending request and enter
    /// `Disconnected`.
    ///
    /// With `Some(epoch)` this only acts if that epoch is still current.
    /// With `None` it also supersedes any connection attempt in flight.
    /// Returns `false` if there was nothing to tear down.
    async fn teardown(&self, epoch: Option<u64>, origin: Origin) -> bool {
        let (link, event) = {
            let mut session = self.session.lock().await;
            match epoch {
                Some(epoch) if epoch != session.epoch => return false,
                Some(_) => {}
                None => session.epoch += 1,
            }
            let link = session.link.take();
            self.cancel_pending();
            (link, self.transition(SessionState::Disconnected))
        };

        let changed = link.is_some() || event.is_some();
        if let Some(link) = link {
            link.shutdown(origin).await;
        }
        self.signal(event);
        changed
    }
}

/// Client for a broadcast-software control server.
///
/// Cloning is cheap; all clones share one session.
#[derive(Clone)]
pub struct ObsClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ObsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObsClient")
            .field("state", &self.state())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Default for ObsClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl ObsClient {
    /// Create a client that connects over WebSocket.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self::with_connector(WebSocketConnector::new(), options)
    }

    #[must_use]
    pub fn with_connector<C>(connector: C, options: ClientOptions) -> Self
    where
        C: Connector + 'static,
    {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                options,
                pending: PendingRequests::new(),
                dispatcher: EventDispatcher::new(),
                session: Mutex::new(Session {
                    epoch: 0,
                    link: None,
                }),
                state,
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Number of requests currently awaiting a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ObsEvent) + Send + Sync + 'static,
    {
        self.inner.dispatcher.subscribe(kind, handler)
    }

    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ObsEvent) + Send + Sync + 'static,
    {
        self.inner.dispatcher.subscribe_all(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    /// Connect to `address`, authenticating with `password` if the server
    /// asks for it. An existing session is disconnected first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the connection cannot be opened,
    /// `Error::AuthFailure` if the server rejects the credentials,
    /// `Error::Cancelled` if `disconnect` or another `connect` supersedes this
    /// attempt, or any request error raised during the handshake. The partial
    /// connection is torn down in every case.
    pub async fn connect(&self, address: &str, password: Option<&str>) -> Result<()> {
        let epoch = self.inner.begin().await;
        tracing::info!("Connecting to {}", address);

        let transport = match self.inner.connector.connect(address).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", address, e);
                self.inner.teardown(Some(epoch), Origin::Caller).await;
                return Err(e.into());
            }
        };

        if !self.inner.install(epoch, transport).await {
            tracing::debug!("Connection attempt to {} was superseded", address);
            return Err(Error::Cancelled);
        }

        if let Err(e) = self.authenticate(password).await {
            tracing::warn!("Handshake with {} failed: {}", address, e);
            self.inner.teardown(Some(epoch), Origin::Caller).await;
            return Err(e);
        }

        if !self.inner.advance(epoch, SessionState::Ready).await {
            return Err(Error::Cancelled);
        }

        tracing::info!("Session ready");
        Ok(())
    }

    async fn authenticate(&self, password: Option<&str>) -> Result<()> {
        let requirement: AuthRequirement = self.request(GET_AUTH_REQUIRED, Fields::new()).await?;
        if !requirement.auth_required {
            tracing::debug!("Server does not require authentication");
            return Ok(());
        }

        let (Some(challenge), Some(salt)) = (requirement.challenge, requirement.salt) else {
            return Err(Error::AuthFailure(
                "server did not send a challenge and salt".to_string(),
            ));
        };
        let Some(password) = password else {
            return Err(Error::AuthFailure("server requires a password".to_string()));
        };

        let params = AuthenticateParams {
            auth: auth::auth_response(password, &salt, &challenge),
        };
        match self.call(AUTHENTICATE, &params).await {
            Ok(()) => {
                tracing::info!("Authenticated");
                Ok(())
            }
            Err(Error::Protocol(message)) => Err(Error::AuthFailure(message)),
            Err(e) => Err(e),
        }
    }

    /// Close the session. Safe to call when not connected.
    ///
    /// Every outstanding request fails with `Error::Cancelled`, including a
    /// handshake still in progress.
    pub async fn disconnect(&self) {
        if self.inner.teardown(None, Origin::Caller).await {
            tracing::info!("Disconnected");
        }
    }

    /// Send a request and wait for its reply fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` without a connection or if the frame cannot
    /// be queued, `Error::Protocol` with the server's text on `status: error`,
    /// `Error::Timeout` when no reply arrives within the request timeout of
    /// the call, and `Error::Cancelled` if the session is torn down first.
    pub async fn send(&self, request_type: &str, fields: Fields) -> Result<Fields> {
        let timeout = self.inner.options.request_timeout;
        let result = tokio::time::timeout(timeout, self.exchange(request_type, fields))
            .await
            .unwrap_or(Err(Error::Timeout));
        match &result {
            Ok(_) => tracing::debug!("Reply to {}", request_type),
            Err(e) => tracing::debug!("{} failed: {}", request_type, e),
        }
        result
    }

    async fn exchange(&self, request_type: &str, fields: Fields) -> Result<Fields> {
        let request = {
            let session = self.inner.session.lock().await;
            let Some(link) = session.link.as_ref() else {
                return Err(TransportError::NotConnected.into());
            };

            let request = self.inner.pending.register();
            let text = Request::new(request_type, request.id().clone(), fields).to_text()?;
            tracing::debug!("Sending {} ({})", request_type, request.id());
            link.outgoing
                .send(text)
                .map_err(|_| TransportError::ConnectionClosed)?;
            request
        };
        request.wait().await
    }

    /// Send a request with serializable fields and decode the reply.
    ///
    /// # Errors
    ///
    /// Same as [`ObsClient::send`], plus `Error::InvalidPayload` if `fields`
    /// does not serialize to an object and `Error::Json` if the reply does
    /// not decode into `T`.
    pub async fn request<T, P>(&self, request_type: &str, fields: P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let reply = self.send(request_type, to_fields(fields)?).await?;
        Ok(serde_json::from_value(Value::Object(reply))?)
    }

    /// Send a request whose reply carries nothing of interest.
    ///
    /// # Errors
    ///
    /// Same as [`ObsClient::send`].
    pub async fn call<P: Serialize>(&self, request_type: &str, fields: P) -> Result<()> {
        self.send(request_type, to_fields(fields)?).await.map(|_| ())
    }
}

fn to_fields<P: Serialize>(fields: P) -> Result<Fields> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Fields::new()),
        other => Err(Error::InvalidPayload(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Write queued frames in order until the queue closes, then close the
/// transport. A failed write tears the session down.
async fn write_loop(
    inner: Weak<Inner>,
    mut sink: FrameSink,
    mut queue: mpsc::UnboundedReceiver<String>,
    epoch: u64,
) {
    while let Some(text) = queue.recv().await {
        if let Err(e) = sink.send(text).await {
            tracing::warn!("Failed to write frame: {}", e);
            if let Some(inner) = inner.upgrade()
                && inner.teardown(Some(epoch), Origin::Writer).await
            {
                tracing::info!("Connection lost");
            }
            return;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("Error closing transport: {}", e);
    }
}

/// Drain inbound frames one at a time, in arrival order, until the transport
/// ends; then tear the session down.
async fn read_loop(inner: Weak<Inner>, mut stream: FrameStream, epoch: u64) {
    while let Some(frame) = stream.next().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        match frame {
            Ok(text) => match Message::parse(&text) {
                Ok(message) => inner.dispatcher.route(message, &inner.pending),
                Err(e) => tracing::warn!("Dropping undecodable message: {}", e),
            },
            Err(e) => {
                tracing::warn!("Transport error: {}", e);
                break;
            }
        }
    }

    if let Some(inner) = inner.upgrade()
        && inner.teardown(Some(epoch), Origin::Reader).await
    {
        tracing::info!("Connection closed by server");
    }
}
