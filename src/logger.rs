//! Pluggable logger for messaging diagnostics.
//!
//! The hub and client report everything that goes wrong (malformed port
//! names, unresolvable targets, failing listeners, unmatched message types)
//! through a [`Logger`] instead of returning errors to the sender.
//!
//! [`TracingLogger`] is the default and forwards to `tracing`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

// ============================================================================
// Types
// ============================================================================

/// Shared logger handle.
pub type LoggerHandle = Arc<dyn Logger>;

// ============================================================================
// Logger
// ============================================================================

/// Fire-and-forget diagnostics sink.
///
/// Implementations must not panic.
pub trait Logger: Send + Sync {
    /// Records an informational event.
    fn info(&self, text: &str, details: Option<&Value>);

    /// Records an unusual but expected condition.
    fn warn(&self, text: &str, details: Option<&Value>);

    /// Records a failure.
    fn error(&self, text: &str, details: Option<&Value>);
}

// ============================================================================
// TracingLogger
// ============================================================================

/// Logger that emits `tracing` events under the `webext_messaging` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Returns a shared handle to a tracing logger.
    #[inline]
    #[must_use]
    pub fn handle() -> LoggerHandle {
        Arc::new(Self)
    }
}

impl Logger for TracingLogger {
    fn info(&self, text: &str, details: Option<&Value>) {
        match details {
            Some(details) => info!(target: "webext_messaging", %details, "{text}"),
            None => info!(target: "webext_messaging", "{text}"),
        }
    }

    fn warn(&self, text: &str, details: Option<&Value>) {
        match details {
            Some(details) => warn!(target: "webext_messaging", %details, "{text}"),
            None => warn!(target: "webext_messaging", "{text}"),
        }
    }

    fn error(&self, text: &str, details: Option<&Value>) {
        match details {
            Some(details) => error!(target: "webext_messaging", %details, "{text}"),
            None => error!(target: "webext_messaging", "{text}"),
        }
    }
}

// ============================================================================
// NoopLogger
// ============================================================================

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _text: &str, _details: Option<&Value>) {}

    fn warn(&self, _text: &str, _details: Option<&Value>) {}

    fn error(&self, _text: &str, _details: Option<&Value>) {}
}

// ============================================================================
// Debug
// ============================================================================

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

// ============================================================================
// Test Support
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
