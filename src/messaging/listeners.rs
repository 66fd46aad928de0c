//! Message type → listener registry.
//!
//! Each hub and client owns one [`ListenerManager`]. Inbound messages are
//! fanned out to every listener subscribed to the message's `type`.
//!
//! # Invariants
//!
//! - A listener appears at most once per type (identity is the `Arc`
//!   allocation, so subscribe the same [`Listener`] clone to dedupe)
//! - A type with no listeners has no registry entry
//!
//! # Example
//!
//! ```
//! use webext_messaging::logger::NoopLogger;
//! use webext_messaging::messaging::{ListenerManager, listener};
//! use webext_messaging::Message;
//! use std::sync::Arc;
//!
//! let manager = ListenerManager::new(Arc::new(NoopLogger));
//! let subscription = manager.subscribe("ping", listener(|message, _sender| {
//!     println!("got {}", message.message_type);
//!     Ok(())
//! }));
//!
//! manager.notify(&Message::empty("ping"), None);
//! subscription.unsubscribe();
//! assert!(!manager.has_listeners("ping"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::json;
use tracing::trace;

use crate::error::Result;
use crate::logger::LoggerHandle;
use crate::protocol::Message;
use crate::transport::PortHandle;

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback.
///
/// Receives the message and, when known, the port it arrived on. Returning
/// `Err` or panicking is logged and does not affect other listeners.
pub type Listener = Arc<dyn Fn(&Message, Option<&PortHandle>) -> Result<()> + Send + Sync>;

/// Type → listeners, in registration order.
type Registry = FxHashMap<String, Vec<Listener>>;

/// Wraps a closure as a [`Listener`].
#[inline]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Message, Option<&PortHandle>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// ListenerManager
// ============================================================================

/// Registry of listeners keyed by message type.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct ListenerManager {
    /// Shared registry.
    registry: Arc<Mutex<Registry>>,
    /// Diagnostics sink.
    logger: LoggerHandle,
}

impl ListenerManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(logger: LoggerHandle) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            logger,
        }
    }

    /// Registers `listener` under `message_type`.
    ///
    /// Subscribing a listener that is already registered for the type is a
    /// no-op; the returned handle still removes it.
    pub fn subscribe(&self, message_type: impl Into<String>, listener: Listener) -> Subscription {
        let message_type = message_type.into();

        {
            let mut registry = self.registry.lock();
            let listeners = registry.entry(message_type.clone()).or_default();
            if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                listeners.push(Arc::clone(&listener));
            }
        }

        trace!(message_type = %message_type, "Listener subscribed");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            message_type,
            listener,
            active: AtomicBool::new(true),
        }
    }

    /// Dispatches `message` to every listener of its type.
    ///
    /// With no listeners a single warning is logged. A listener that returns
    /// `Err` or panics is logged individually and never stops the remaining
    /// listeners.
    pub fn notify(&self, message: &Message, sender: Option<&PortHandle>) {
        let message_type = message.message_type();
        let listeners = self.registry.lock().get(message_type).cloned();

        let Some(listeners) = listeners else {
            self.logger.warn(
                "No listeners for message type",
                Some(&json!({
                    "type": message_type,
                    "sender": sender.map(|port| port.name()),
                })),
            );
            return;
        };

        for listener in &listeners {
            // Unsubscribed by an earlier listener in this dispatch.
            if !self.is_registered(message_type, listener) {
                continue;
            }

            let error = match panic::catch_unwind(AssertUnwindSafe(|| listener(message, sender))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            self.logger.error(
                "Listener failed",
                Some(&json!({
                    "type": message_type,
                    "sender": sender.map(|port| port.name()),
                    "error": error,
                })),
            );
        }
    }

    /// Removes every type and listener.
    pub fn clear(&self) {
        self.registry.lock().clear();
        trace!("Listeners cleared");
    }

    /// Returns `true` if at least one listener is registered for the type.
    #[inline]
    #[must_use]
    pub fn has_listeners(&self, message_type: &str) -> bool {
        self.registry.lock().contains_key(message_type)
    }

    /// Number of listeners registered for the type.
    #[inline]
    #[must_use]
    pub fn listener_count(&self, message_type: &str) -> usize {
        self.registry
            .lock()
            .get(message_type)
            .map_or(0, Vec::len)
    }

    /// Number of types with at least one listener.
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.registry.lock().len()
    }

    fn is_registered(&self, message_type: &str, listener: &Listener) -> bool {
        self.registry
            .lock()
            .get(message_type)
            .is_some_and(|listeners| listeners.iter().any(|l| Arc::ptr_eq(l, listener)))
    }
}

impl fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerManager")
            .field("types", &self.type_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle returned by [`ListenerManager::subscribe`].
///
/// Dropping the handle leaves the listener registered.
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe() to remove it"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    message_type: String,
    listener: Listener,
    active: AtomicBool,
}

impl Subscription {
    /// Removes the listener from its type.
    ///
    /// Drops the type entry when it was the last listener. Only the first
    /// call has an effect.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let mut registry = registry.lock();
        if let Some(listeners) = registry.get_mut(&self.message_type) {
            listeners.retain(|l| !Arc::ptr_eq(l, &self.listener));
            if listeners.is_empty() {
                registry.remove(&self.message_type);
            }
        }

        trace!(message_type = %self.message_type, "Listener unsubscribed");
    }

    /// Message type this subscription was made for.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Returns `true` until [`unsubscribe`](Self::unsubscribe) is called.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("message_type", &self.message_type)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts the text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "listener panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
