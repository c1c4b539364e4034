//! Inbound routing and event fan-out.
//!
//! Every inbound envelope goes through [`EventDispatcher::route`]: replies are
//! handed to the correlation engine, notifications are decoded through a fixed
//! update-type table and passed to subscribers, and anything else is dropped.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use obsws_types::{EventKind, ObsEvent, OutputChange, OutputState};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::correlation::PendingRequests;
use crate::protocol::{Fields, Message, Notification};

/// Callback invoked for each matching event
pub type EventHandler = Arc<dyn Fn(&ObsEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Decoder = fn(Fields) -> Result<ObsEvent, serde_json::Error>;

fn payload<T: DeserializeOwned>(fields: Fields) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(fields))
}

/// `StreamStarting`, `RecordingStopped`, `ReplayStarted` and friends. The
/// stream and recording families carry their own output's timecode.
fn output_state_event(notification: &Notification) -> Option<ObsEvent> {
    let update_type = notification.update_type.as_str();
    let (event, suffix, timecode): (fn(OutputChange) -> ObsEvent, &str, Option<&String>) =
        if let Some(suffix) = update_type.strip_prefix("Stream") {
            (
                ObsEvent::StreamingStateChanged,
                suffix,
                notification.stream_timecode.as_ref(),
            )
        } else if let Some(suffix) = update_type.strip_prefix("Recording") {
            (
                ObsEvent::RecordingStateChanged,
                suffix,
                notification.rec_timecode.as_ref(),
            )
        } else if let Some(suffix) = update_type.strip_prefix("Replay") {
            (ObsEvent::ReplayBufferStateChanged, suffix, None)
        } else {
            return None;
        };
    let state = OutputState::from_suffix(suffix)?;
    Some(event(OutputChange::new(state).with_timecode(timecode.cloned())))
}

fn decoder(update_type: &str) -> Option<Decoder> {
    let decoder: Decoder = match update_type {
        "SwitchScenes" => |f| payload(f).map(ObsEvent::SceneSwitched),
        "ScenesChanged" => |f| payload(f).map(ObsEvent::ScenesChanged),
        "SceneCollectionChanged" => |f| payload(f).map(ObsEvent::SceneCollectionChanged),
        "SceneCollectionListChanged" => |_| Ok(ObsEvent::SceneCollectionListChanged),
        "SwitchTransition" => |f| payload(f).map(ObsEvent::TransitionSwitched),
        "TransitionListChanged" => |_| Ok(ObsEvent::TransitionListChanged),
        "TransitionDurationChanged" => |f| payload(f).map(ObsEvent::TransitionDurationChanged),
        "TransitionBegin" => |f| payload(f).map(ObsEvent::TransitionBegin),
        "ProfileChanged" => |f| payload(f).map(ObsEvent::ProfileChanged),
        "ProfileListChanged" => |_| Ok(ObsEvent::ProfileListChanged),
        "StreamStatus" => |f| payload(f).map(ObsEvent::StreamStatus),
        "Heartbeat" => |f| payload(f).map(ObsEvent::Heartbeat),
        "PreviewSceneChanged" => |f| payload(f).map(ObsEvent::PreviewSceneChanged),
        "StudioModeSwitched" => |f| payload(f).map(ObsEvent::StudioModeSwitched),
        "SourceOrderChanged" => |f| payload(f).map(ObsEvent::SourceOrderChanged),
        "SceneItemAdded" => |f| payload(f).map(ObsEvent::SceneItemAdded),
        "SceneItemRemoved" => |f| payload(f).map(ObsEvent::SceneItemRemoved),
        "SceneItemVisibilityChanged" => |f| payload(f).map(ObsEvent::SceneItemVisibilityChanged),
        "Exiting" => |_| Ok(ObsEvent::Exiting),
        _ => return None,
    };
    Some(decoder)
}

/// Decode a notification into a typed event.
///
/// Returns `None` for update types outside the known set.
pub fn decode_event(notification: Notification) -> Option<Result<ObsEvent, serde_json::Error>> {
    if let Some(event) = output_state_event(&notification) {
        return Some(Ok(event));
    }
    let decode = decoder(&notification.update_type)?;
    Some(decode(notification.fields))
}

#[derive(Default)]
struct Registry {
    by_kind: HashMap<EventKind, Vec<(SubscriptionId, EventHandler)>>,
    wildcard: Vec<(SubscriptionId, EventHandler)>,
}

/// Subscriber registry and router for inbound envelopes
#[derive(Default)]
pub struct EventDispatcher {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let handlers: usize = registry.by_kind.values().map(Vec::len).sum();
        f.debug_struct("EventDispatcher")
            .field("handlers", &handlers)
            .field("wildcard", &registry.wildcard.len())
            .finish()
    }
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a handler for one event kind. Handlers run in registration
    /// order.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ObsEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .by_kind
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Register a handler that sees every event, after the kind-specific
    /// handlers.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ObsEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .wildcard
            .push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let before = registry.wildcard.len();
        registry.wildcard.retain(|(sub, _)| *sub != id);
        if registry.wildcard.len() != before {
            return true;
        }
        for handlers in registry.by_kind.values_mut() {
            let before = handlers.len();
            handlers.retain(|(sub, _)| *sub != id);
            if handlers.len() != before {
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_kind
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's kind, then the
    /// wildcard handlers. A panicking handler is logged and skipped.
    ///
    /// Returns the number of handlers that ran to completion.
    pub fn emit(&self, event: &ObsEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry
                .by_kind
                .get(&kind)
                .into_iter()
                .flatten()
                .chain(registry.wildcard.iter())
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };

        let mut completed = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => completed += 1,
                Err(_) => tracing::warn!("Event handler for '{}' panicked", kind),
            }
        }
        completed
    }

    /// Decode a notification and fan it out. Unknown update types and
    /// undecodable payloads are dropped.
    pub fn dispatch(&self, notification: Notification) -> usize {
        let update_type = notification.update_type.clone();
        match decode_event(notification) {
            Some(Ok(event)) => self.emit(&event),
            Some(Err(e)) => {
                tracing::warn!("Failed to decode '{}' notification: {}", update_type, e);
                0
            }
            None => {
                tracing::debug!("Ignoring unknown update type '{}'", update_type);
                0
            }
        }
    }

    /// Route one inbound envelope.
    pub fn route(&self, message: Message, pending: &PendingRequests) {
        match message {
            Message::Reply(reply) => {
                pending.complete(reply);
            }
            Message::Notification(notification) => {
                self.dispatch(notification);
            }
            Message::Unroutable(value) => {
                tracing::debug!("Dropping unroutable message: {}", value);
            }
        }
    }
}
