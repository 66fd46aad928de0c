//! Tagged message type exchanged between contexts.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "settings.changed",
//!   "data": { ... }
//! }
//! ```
//!
//! `type` is the dispatch key. `data` is caller-defined and never inspected
//! by the messaging layer.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Message
// ============================================================================

/// A tagged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Dispatch key.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Opaque payload.
    #[serde(default)]
    pub data: Value,
}

impl Message {
    /// Creates a message with a raw JSON payload.
    #[inline]
    #[must_use]
    pub fn new(message_type: impl Into<String>, data: Value) -> Self {
        Self {
            message_type: message_type.into(),
            data,
        }
    }

    /// Creates a message with no payload (`null`).
    #[inline]
    #[must_use]
    pub fn empty(message_type: impl Into<String>) -> Self {
        Self::new(message_type, Value::Null)
    }

    /// Creates a message by serializing a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `data` cannot be serialized.
    pub fn from_data<T: Serialize>(message_type: impl Into<String>, data: &T) -> Result<Self> {
        Ok(Self::new(message_type, serde_json::to_value(data)?))
    }

    /// Returns the dispatch key.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Deserializes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the payload does not match `T`.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ThemeChanged {
        theme: String,
        dark: bool,
    }

    #[test]
    fn test_message_wire_format() {
        let message = Message::new("ping", json!({ "n": 1 }));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({ "type": "ping", "data": { "n": 1 } }));
    }

    #[test]
    fn test_message_missing_data_is_null() {
        let message: Message = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(message.message_type(), "ping");
        assert!(message.data.is_null());
    }

    #[test]
    fn test_typed_payload() {
        let payload = ThemeChanged {
            theme: "solarized".into(),
            dark: true,
        };
        let message = Message::from_data("theme.changed", &payload).unwrap();
        assert_eq!(message.parse_data::<ThemeChanged>().unwrap(), payload);
    }

    #[test]
    fn test_parse_data_mismatch() {
        let message = Message::new("theme.changed", json!("not an object"));
        let err = message.parse_data::<ThemeChanged>().unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }

    #[test]
    fn test_empty_message() {
        let message = Message::empty("refresh");
        assert_eq!(message.message_type, "refresh");
        assert_eq!(message.data, Value::Null);
    }
}
