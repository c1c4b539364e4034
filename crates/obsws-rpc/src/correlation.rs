//! Correlation of replies to outstanding requests.
//!
//! Each request gets a random alphanumeric message id and a oneshot slot.
//! Whichever of reply, teardown, or the caller giving up removes the entry
//! from the map first resolves the request; the others find nothing and
//! no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::protocol::{Fields, MessageId, Reply};

/// Length of generated message ids
pub const MESSAGE_ID_LEN: usize = 16;

/// Value written into a pending request's slot
pub type Completion = Result<Fields>;

type Slot = oneshot::Sender<Completion>;

/// Generate a random alphanumeric message id.
#[must_use]
pub fn random_message_id() -> MessageId {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MESSAGE_ID_LEN)
        .map(char::from)
        .collect();
    MessageId::from(id)
}

/// Draw ids until one is not already active.
fn unique_id<F>(active: &HashMap<MessageId, Slot>, mut generate: F) -> MessageId
where
    F: FnMut() -> MessageId,
{
    loop {
        let id = generate();
        if !active.contains_key(&id) {
            return id;
        }
        tracing::debug!("Message id {} already pending, regenerating", id);
    }
}

/// The live set of pending requests, keyed by message id
#[derive(Debug, Default, Clone)]
pub struct PendingRequests {
    inner: Arc<Mutex<HashMap<MessageId, Slot>>>,
}

impl PendingRequests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MessageId, Slot>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new pending request under a fresh id.
    #[must_use]
    pub fn register(&self) -> PendingRequest {
        self.register_with(random_message_id)
    }

    fn register_with<F>(&self, generate: F) -> PendingRequest
    where
        F: FnMut() -> MessageId,
    {
        let mut pending = self.lock();
        let id = unique_id(&pending, generate);
        let (tx, rx) = oneshot::channel();
        pending.insert(id.clone(), tx);
        PendingRequest {
            id,
            rx: Some(rx),
            pending: self.clone(),
        }
    }

    /// Resolve the request a reply answers.
    ///
    /// Returns `false` when no request with that id is pending (late or
    /// duplicate reply) or its caller has stopped waiting.
    pub fn complete(&self, reply: Reply) -> bool {
        let Some(slot) = self.lock().remove(&reply.message_id) else {
            tracing::debug!(
                "Dropping reply for unknown message id {}",
                reply.message_id
            );
            return false;
        };

        let completion = reply.into_result().map_err(Error::Protocol);
        slot.send(completion).is_ok()
    }

    /// Drop the entry for `id` if nobody is waiting on it any more.
    fn forget_abandoned(&self, id: &MessageId) {
        let mut pending = self.lock();
        if pending.get(id).is_some_and(oneshot::Sender::is_closed) {
            pending.remove(id);
            tracing::debug!("Request {} abandoned by its caller", id);
        }
    }

    /// Resolve every pending request with `Cancelled` and clear the set.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(MessageId, Slot)> = self.lock().drain().collect();
        let count = drained.len();
        for (id, slot) in drained {
            tracing::debug!("Cancelling pending request {}", id);
            let _ = slot.send(Err(Error::Cancelled));
        }
        count
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.lock().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// One outstanding request.
///
/// Dropping it before it resolves (a timeout, an abandoned future, an
/// aborted task) removes its entry from the pending set.
#[derive(Debug)]
pub struct PendingRequest {
    id: MessageId,
    rx: Option<oneshot::Receiver<Completion>>,
    pending: PendingRequests,
}

impl PendingRequest {
    #[must_use]
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` when the server reported a failure and
    /// `Error::Cancelled` on teardown.
    pub async fn wait(mut self) -> Result<Fields> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(Error::Cancelled);
        };
        rx.await.unwrap_or(Err(Error::Cancelled))
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        // Closing the receiver first marks the slot abandoned, so an entry
        // that was already resolved and re-registered under the same id is
        // left alone.
        drop(self.rx.take());
        self.pending.forget_abandoned(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    fn ok_reply(id: &MessageId, value: serde_json::Value) -> Reply {
        let serde_json::Value::Object(fields) = value else {
            panic!("Expected object");
        };
        Reply::ok(id.clone(), fields)
    }

    #[test]
    fn test_random_message_id_shape() {
        let id = random_message_id();
        assert_eq!(id.as_str().len(), MESSAGE_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_ten_thousand_pending_ids_are_distinct() {
        let pending = PendingRequests::new();
        let mut ids = HashSet::new();
        let mut requests = Vec::new();

        for _ in 0..10_000 {
            let request = pending.register();
            assert!(
                ids.insert(request.id().clone()),
                "Duplicate message id among pending requests"
            );
            requests.push(request);
        }

        assert_eq!(pending.len(), 10_000);
    }

    #[test]
    fn test_register_rerolls_on_collision() {
        let pending = PendingRequests::new();
        let first = pending.register_with(|| MessageId::from("fixed"));
        assert_eq!(first.id().as_str(), "fixed");

        let mut script = vec![MessageId::from("other"), MessageId::from("fixed")];
        let second = pending.register_with(|| script.pop().unwrap_or_else(random_message_id));

        assert_eq!(second.id().as_str(), "other");
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_delivers_ok_fields() {
        let pending = PendingRequests::new();
        let request = pending.register();

        assert!(pending.complete(ok_reply(request.id(), json!({"name": "Intro"}))));

        let fields = request.wait().await.unwrap();
        assert_eq!(fields.get("name"), Some(&json!("Intro")));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_complete_delivers_server_error_text() {
        let pending = PendingRequests::new();
        let request = pending.register();

        pending.complete(Reply::error(
            request.id().clone(),
            "requested scene does not exist",
        ));

        match request.wait().await {
            Err(Error::Protocol(message)) => {
                assert_eq!(message, "requested scene does not exist");
            }
            other => panic!("Expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_reply_leaves_others_untouched() {
        let pending = PendingRequests::new();
        let request = pending.register();

        let delivered = pending.complete(ok_reply(&MessageId::from("nobody"), json!({})));

        assert!(!delivered);
        assert!(pending.contains(request.id()));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_reply_is_dropped() {
        let pending = PendingRequests::new();
        let request = pending.register();
        let id = request.id().clone();

        assert!(pending.complete(ok_reply(&id, json!({"n": 1}))));
        assert!(!pending.complete(ok_reply(&id, json!({"n": 2}))));

        let fields = request.wait().await.unwrap();
        assert_eq!(fields.get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_cancel_all_resolves_everything() {
        let pending = PendingRequests::new();
        let first = pending.register();
        let second = pending.register();

        assert_eq!(pending.cancel_all(), 2);
        assert!(pending.is_empty());
        assert!(matches!(first.wait().await, Err(Error::Cancelled)));
        assert!(matches!(second.wait().await, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cancel_all_when_empty() {
        let pending = PendingRequests::new();
        assert_eq!(pending.cancel_all(), 0);
    }

    #[test]
    fn test_dropping_request_removes_entry() {
        let pending = PendingRequests::new();
        let kept = pending.register();
        let dropped = pending.register();
        let dropped_id = dropped.id().clone();

        drop(dropped);

        assert!(!pending.contains(&dropped_id));
        assert!(pending.contains(kept.id()));
        assert!(!pending.complete(ok_reply(&dropped_id, json!({}))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_wait_removes_entry_and_drops_late_reply() {
        let pending = PendingRequests::new();
        let request = pending.register();
        let id = request.id().clone();

        let result = tokio::time::timeout(Duration::from_millis(50), request.wait()).await;
        assert!(result.is_err());
        assert!(!pending.contains(&id));

        assert!(!pending.complete(ok_reply(&id, json!({}))));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_stale_request_does_not_remove_reused_id() {
        let pending = PendingRequests::new();
        let stale = pending.register_with(|| MessageId::from("same"));
        assert!(pending.complete(ok_reply(stale.id(), json!({}))));

        let fresh = pending.register_with(|| MessageId::from("same"));
        drop(stale);

        assert!(pending.contains(fresh.id()));
    }

    #[tokio::test]
    async fn test_wait_sees_cancellation() {
        let pending = PendingRequests::new();
        let request = pending.register();

        let waiter = tokio::spawn(request.wait());
        tokio::task::yield_now().await;
        pending.cancel_all();

        assert!(matches!(waiter.await.unwrap(), Err(Error::Cancelled)));
    }
}
