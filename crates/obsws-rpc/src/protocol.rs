//! Wire envelope types.
//!
//! Every message is one flat JSON object. Requests carry `request-type` and
//! `message-id` next to the operation fields, replies echo `message-id` with a
//! `status`, and notifications carry an `update-type` discriminator instead of
//! a message id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const REQUEST_TYPE: &str = "request-type";
pub const MESSAGE_ID: &str = "message-id";
pub const STATUS: &str = "status";
pub const ERROR: &str = "error";
pub const UPDATE_TYPE: &str = "update-type";
pub const STREAM_TIMECODE: &str = "stream-timecode";
pub const REC_TIMECODE: &str = "rec-timecode";
pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// Operation-specific fields merged into an envelope
pub type Fields = Map<String, Value>;

/// Correlation identifier tagging one outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Outgoing request envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub request_type: String,
    pub message_id: MessageId,
    pub fields: Fields,
}

impl Request {
    #[must_use]
    pub fn new(request_type: impl Into<String>, message_id: MessageId, fields: Fields) -> Self {
        Self {
            request_type: request_type.into(),
            message_id,
            fields,
        }
    }

    /// Build the flat wire object. Reserved keys in `fields` are overwritten.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = self.fields;
        map.insert(REQUEST_TYPE.to_string(), Value::String(self.request_type));
        map.insert(
            MESSAGE_ID.to_string(),
            Value::String(self.message_id.0),
        );
        Value::Object(map)
    }

    /// Serialize to a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be serialized.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.clone().into_value())
    }
}

/// Outcome reported by the server for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error(String),
}

/// Reply envelope answering a request
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message_id: MessageId,
    pub status: Status,
    pub fields: Fields,
}

impl Reply {
    #[must_use]
    pub fn ok(message_id: MessageId, fields: Fields) -> Self {
        Self {
            message_id,
            status: Status::Ok,
            fields,
        }
    }

    #[must_use]
    pub fn error(message_id: MessageId, message: impl Into<String>) -> Self {
        Self {
            message_id,
            status: Status::Error(message.into()),
            fields: Fields::new(),
        }
    }

    /// Split into the result fields or the server's error text.
    ///
    /// # Errors
    ///
    /// Returns the server-supplied error message when the status is not `ok`.
    pub fn into_result(self) -> Result<Fields, String> {
        match self.status {
            Status::Ok => Ok(self.fields),
            Status::Error(message) => Err(message),
        }
    }

    /// Any status other than `ok` is an error; a missing `error` text falls
    /// back to a generic message. Hands the envelope back if `message-id` is
    /// not a string.
    fn from_fields(mut map: Fields) -> Result<Self, Fields> {
        let id = match map.remove(MESSAGE_ID) {
            Some(Value::String(id)) => id,
            Some(other) => {
                map.insert(MESSAGE_ID.to_string(), other);
                return Err(map);
            }
            None => return Err(map),
        };
        let status = match map.remove(STATUS) {
            Some(Value::String(s)) if s == STATUS_OK => Status::Ok,
            _ => {
                let message = match map.remove(ERROR) {
                    Some(Value::String(e)) => e,
                    _ => "unknown error".to_string(),
                };
                Status::Error(message)
            }
        };
        Ok(Self {
            message_id: MessageId(id),
            status,
            fields: map,
        })
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = self.fields;
        map.insert(MESSAGE_ID.to_string(), Value::String(self.message_id.0));
        match self.status {
            Status::Ok => {
                map.insert(STATUS.to_string(), Value::String(STATUS_OK.to_string()));
            }
            Status::Error(message) => {
                map.insert(STATUS.to_string(), Value::String(STATUS_ERROR.to_string()));
                map.insert(ERROR.to_string(), Value::String(message));
            }
        }
        Value::Object(map)
    }
}

/// Unsolicited state-change notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub update_type: String,
    pub stream_timecode: Option<String>,
    pub rec_timecode: Option<String>,
    pub fields: Fields,
}

impl Notification {
    #[must_use]
    pub fn new(update_type: impl Into<String>, fields: Fields) -> Self {
        Self {
            update_type: update_type.into(),
            stream_timecode: None,
            rec_timecode: None,
            fields,
        }
    }

    /// Timecodes are copied out but left in `fields`, so payloads that
    /// declare them still decode them. Hands the envelope back if
    /// `update-type` is missing or not a string.
    fn from_fields(mut map: Fields) -> Result<Self, Fields> {
        let update_type = match map.remove(UPDATE_TYPE) {
            Some(Value::String(update_type)) => update_type,
            Some(other) => {
                map.insert(UPDATE_TYPE.to_string(), other);
                return Err(map);
            }
            None => return Err(map),
        };
        let timecode = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let stream_timecode = timecode(STREAM_TIMECODE);
        let rec_timecode = timecode(REC_TIMECODE);
        Ok(Self {
            update_type,
            stream_timecode,
            rec_timecode,
            fields: map,
        })
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = self.fields;
        map.insert(UPDATE_TYPE.to_string(), Value::String(self.update_type));
        if let Some(tc) = self.stream_timecode {
            map.insert(STREAM_TIMECODE.to_string(), Value::String(tc));
        }
        if let Some(tc) = self.rec_timecode {
            map.insert(REC_TIMECODE.to_string(), Value::String(tc));
        }
        Value::Object(map)
    }
}

/// Decoded inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Reply(Reply),
    Notification(Notification),
    /// Neither a reply nor a notification; dropped by the dispatcher
    Unroutable(Value),
}

impl Message {
    /// Parse a text frame into a `Message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not valid JSON.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::classify(value))
    }

    /// Classify by structure: a `message-id` makes a reply, otherwise an
    /// `update-type` makes a notification.
    #[must_use]
    pub fn classify(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::Unroutable(value);
        };

        if map.contains_key(MESSAGE_ID) {
            return Reply::from_fields(map)
                .map_or_else(|map| Self::Unroutable(Value::Object(map)), Self::Reply);
        }

        Notification::from_fields(map)
            .map_or_else(|map| Self::Unroutable(Value::Object(map)), Self::Notification)
    }

    /// Serialize back to a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be serialized.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        let value = match self.clone() {
            Self::Reply(reply) => reply.into_value(),
            Self::Notification(notification) => notification.into_value(),
            Self::Unroutable(value) => value,
        };
        serde_json::to_string(&value)
    }
}
