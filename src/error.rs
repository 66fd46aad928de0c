//! Error types for WebExtension messaging.
//!
//! The messaging operations themselves (`send_message`, `subscribe`) never
//! fail across the public boundary; failures there are reported through the
//! [`Logger`](crate::logger::Logger). This type covers the fallible
//! surrounding API: builders, port name parsing, payload decoding, readiness
//! waits, and listener callbacks.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Naming | [`Error::InvalidConnectionName`], [`Error::UnknownRole`], [`Error::InvalidTargetId`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Dispatch | [`Error::Listener`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a hub or client builder is missing required settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Naming Errors
    // ========================================================================
    /// Port name does not follow the `<role>:<targetId>` format.
    #[error("Invalid connection name {name:?}: {reason}")]
    InvalidConnectionName {
        /// The rejected port name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// Role token outside the recognized set.
    #[error("Unknown role: {role:?}")]
    UnknownRole {
        /// The unrecognized token.
        role: String,
    },

    /// Target id that is not a decimal `u32`.
    #[error("Invalid target id: {value:?}")]
    InvalidTargetId {
        /// The unparseable value.
        value: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Client did not reach the connected state in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Client was dropped while a caller was waiting on it.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// Failure reported by a message listener.
    ///
    /// Logged by the dispatcher; never propagated to the sender.
    #[error("Listener failed: {message}")]
    Listener {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid connection name error.
    #[inline]
    pub fn invalid_connection_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConnectionName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown role error.
    #[inline]
    pub fn unknown_role(role: impl Into<String>) -> Self {
        Self::UnknownRole { role: role.into() }
    }

    /// Creates an invalid target id error.
    #[inline]
    pub fn invalid_target_id(value: impl Into<String>) -> Self {
        Self::InvalidTargetId {
            value: value.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a listener error.
    #[inline]
    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from port name parsing.
    #[inline]
    #[must_use]
    pub fn is_naming_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConnectionName { .. } | Self::UnknownRole { .. } | Self::InvalidTargetId { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::ConnectionClosed
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("host is required");
        assert_eq!(err.to_string(), "Configuration error: host is required");
    }

    #[test]
    fn test_invalid_connection_name_display() {
        let err = Error::invalid_connection_name("popup", "missing ':' separator");
        assert_eq!(
            err.to_string(),
            "Invalid connection name \"popup\": missing ':' separator"
        );
    }

    #[test]
    fn test_is_naming_error() {
        assert!(Error::unknown_role("bogus").is_naming_error());
        assert!(Error::invalid_target_id("abc").is_naming_error());
        assert!(Error::invalid_connection_name("x", "y").is_naming_error());
        assert!(!Error::listener("boom").is_naming_error());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection_timeout(100).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::connection_timeout(5000).is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
