//! # DIDComm Message Envelope
//!
//! Protocol messages travel as plain JSON objects. The engine only needs a
//! handful of things from them: the `@id`, the `@type` discriminator, the
//! `~thread` decorator that ties a message to a conversation, and a way to
//! decode the body into one of the typed payloads.
//!
//! ```text
//! {
//!   "@id":   "5f0c…",
//!   "@type": "https://didcomm.org/present-proof/2.0/request-presentation",
//!   "~thread": { "thid": "1a2b…", "pthid": "…" },
//!   …payload fields…
//! }
//! ```
//!
//! A message without `~thread` opens a new conversation: its thread id is
//! its own `@id`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{JSON_ID, JSON_PARENT_THREAD_ID, JSON_THREAD, JSON_THREAD_ID, JSON_TYPE};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload is not a JSON object, or does not fit the target type.
    #[error("malformed message: {0}")]
    Decode(String),

    /// Neither `~thread.thid` nor `@id` is present.
    #[error("thread ID not found")]
    ThreadIdNotFound,
}

/// A DIDComm message as a JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DidCommMsg {
    fields: Map<String, Value>,
}

impl DidCommMsg {
    /// Wrap a typed payload. A fresh `@id` is assigned when the payload
    /// does not carry one.
    pub fn from_payload<T: Serialize>(payload: &T) -> Result<Self, EnvelopeError> {
        let fields = match serde_json::to_value(payload)
            .map_err(|e| EnvelopeError::Decode(e.to_string()))?
        {
            Value::Object(fields) => fields,
            other => {
                return Err(EnvelopeError::Decode(format!(
                    "payload must serialize to an object, got {other}"
                )))
            }
        };

        let mut msg = Self { fields };
        if msg.id().is_none() {
            msg.set_id(uuid::Uuid::new_v4().to_string());
        }
        Ok(msg)
    }

    pub fn from_json(raw: &str) -> Result<Self, EnvelopeError> {
        match serde_json::from_str(raw).map_err(|e| EnvelopeError::Decode(e.to_string()))? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(EnvelopeError::Decode("message is not a JSON object".into())),
        }
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get(JSON_ID).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields.insert(JSON_ID.into(), Value::String(id.into()));
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.fields.get(JSON_TYPE).and_then(Value::as_str)
    }

    /// Whether the message carries a thread reference, i.e. belongs to a
    /// conversation that already exists.
    pub fn has_thread(&self) -> bool {
        self.fields.contains_key(JSON_THREAD)
    }

    /// `~thread.thid`, falling back to `@id` for the opening message.
    pub fn thread_id(&self) -> Result<String, EnvelopeError> {
        self.thread_field(JSON_THREAD_ID)
            .or_else(|| self.id())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(EnvelopeError::ThreadIdNotFound)
    }

    pub fn parent_thread_id(&self) -> Option<&str> {
        self.thread_field(JSON_PARENT_THREAD_ID)
            .filter(|id| !id.is_empty())
    }

    pub fn set_thread(&mut self, thid: impl Into<String>) {
        self.set_thread_field(JSON_THREAD_ID, thid.into());
    }

    pub fn set_parent_thread(&mut self, pthid: impl Into<String>) {
        self.set_thread_field(JSON_PARENT_THREAD_ID, pthid.into());
    }

    /// Give an inbound opening message an explicit `~thread` so that every
    /// later step treats it as part of the conversation it started.
    pub fn ensure_thread(&mut self) -> Result<(), EnvelopeError> {
        if self.thread_field(JSON_THREAD_ID).is_none() {
            let thid = self.thread_id()?;
            self.set_thread(thid);
        }
        Ok(())
    }

    /// Decode the whole message into a typed payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| EnvelopeError::Decode(e.to_string()))
    }

    fn thread_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(JSON_THREAD)
            .and_then(|t| t.get(key))
            .and_then(Value::as_str)
    }

    fn set_thread_field(&mut self, key: &str, value: String) {
        let mut thread = match self.fields.remove(JSON_THREAD) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        thread.insert(key.into(), Value::String(value));
        self.fields.insert(JSON_THREAD.into(), Value::Object(thread));
    }
}
