//! Inbound webhook payloads.
//!
//! Automation clients are loose about field names, so extraction is
//! best-effort: the first usable value among a list of known keys wins, and
//! text may also be nested one level down under `data` or `payload`.

use autoreply_core::ConversationId;
use serde_json::{Map, Value};
use std::collections::HashMap;

const ID_KEYS: &[&str] = &["jid", "wa_id", "from"];
const NAME_KEYS: &[&str] = &["name", "profile_name", "chat_name"];
const TEXT_KEYS: &[&str] = &[
    "text",
    "message",
    "body",
    "MESSAGE",
    "MESSAGE-TEXT",
    "message-text",
    "content",
];
const WRAPPER_KEYS: &[&str] = &["data", "payload"];

const UNKNOWN_ID: &str = "unknown";
const UNKNOWN_NAME: &str = "User";

/// A message extracted from a webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub conversation_id: ConversationId,
    /// Display name of the sender; only used for logging.
    pub sender_name: String,
    /// Message text, verbatim. Empty when the payload carried none.
    pub text: String,
}

impl InboundMessage {
    /// Extracts a message from a decoded JSON body. Anything that is not an
    /// object is treated as an empty payload.
    #[must_use]
    pub fn from_json(payload: &Value) -> Self {
        let empty = Map::new();
        let fields = payload.as_object().unwrap_or(&empty);

        let conversation_id = first_identifier(fields)
            .unwrap_or_else(|| UNKNOWN_ID.to_string())
            .into();
        let sender_name = first_string(fields, NAME_KEYS)
            .unwrap_or(UNKNOWN_NAME)
            .to_string();
        let text = extract_text(fields).unwrap_or_default().to_string();

        Self {
            conversation_id,
            sender_name,
            text,
        }
    }

    /// Extracts a message from form-encoded fields.
    #[must_use]
    pub fn from_form(fields: HashMap<String, String>) -> Self {
        let object: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Self::from_json(&Value::Object(object))
    }

    /// Returns true if there is nothing to answer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Identifiers may arrive as strings or, for `wa_id`, as bare numbers.
fn first_identifier(fields: &Map<String, Value>) -> Option<String> {
    ID_KEYS.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_string<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| fields.get(*key)?.as_str().filter(|s| !s.is_empty()))
}

fn first_text(fields: &Map<String, Value>) -> Option<&str> {
    TEXT_KEYS.iter().find_map(|key| {
        fields
            .get(*key)?
            .as_str()
            .filter(|s| !s.trim().is_empty())
    })
}

fn extract_text(fields: &Map<String, Value>) -> Option<&str> {
    first_text(fields).or_else(|| {
        WRAPPER_KEYS
            .iter()
            .filter_map(|key| fields.get(*key)?.as_object())
            .find_map(first_text)
    })
}
