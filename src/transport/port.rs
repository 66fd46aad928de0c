//! Host capability traits.
//!
//! The messaging layer never talks to a browser directly. It consumes two
//! injected capabilities:
//!
//! - [`Port`] - one named, bidirectional channel between two contexts
//! - [`Host`] - the runtime that opens ports, announces incoming ones,
//!   and tells a client which target it belongs to

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::identifiers::TargetId;
use crate::protocol::Message;

// ============================================================================
// Types
// ============================================================================

/// Shared port handle.
pub type PortHandle = Arc<dyn Port>;

/// Shared host handle.
pub type HostHandle = Arc<dyn Host>;

/// Callback invoked for each message arriving on a port.
pub type MessageHandler = Box<dyn Fn(Message) + Send + Sync>;

/// Callback invoked once when the other end of a port goes away.
pub type DisconnectHandler = Box<dyn Fn() + Send + Sync>;

/// Callback invoked for each port opened towards this context.
pub type ConnectHandler = Box<dyn Fn(PortHandle) + Send + Sync>;

// ============================================================================
// Port
// ============================================================================

/// A named bidirectional channel.
///
/// Implementations must not hold internal locks while invoking handlers;
/// handlers are allowed to post on the same port.
pub trait Port: Send + Sync {
    /// Name the port was opened with.
    fn name(&self) -> &str;

    /// Posts a message to the other end. Best effort.
    fn post_message(&self, message: &Message);

    /// Registers a handler for inbound messages.
    fn on_message(&self, handler: MessageHandler);

    /// Registers a handler fired when the other end disconnects.
    fn on_disconnect(&self, handler: DisconnectHandler);

    /// Closes the port from this end.
    ///
    /// Fires the other end's disconnect handlers, not this end's.
    fn disconnect(&self);
}

impl fmt::Debug for dyn Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port").field("name", &self.name()).finish()
    }
}

// ============================================================================
// Host
// ============================================================================

/// The runtime that owns ports.
#[async_trait]
pub trait Host: Send + Sync {
    /// Opens a port to the hub under `name`.
    ///
    /// Handle creation is synchronous.
    fn connect(&self, name: &str) -> PortHandle;

    /// Registers a handler for ports opened towards this context.
    ///
    /// Registered once per process; there is no way to remove it.
    fn on_connect(&self, handler: ConnectHandler);

    /// Resolves the target the calling context belongs to.
    ///
    /// Returns `None` when the host cannot determine one.
    async fn resolve_target_id(&self) -> Option<TargetId>;
}

impl fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Host")
    }
}
