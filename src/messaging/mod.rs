//! Publish/subscribe messaging between hub and clients.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ListenerManager`] | Message type → listeners, with failure-isolated dispatch |
//! | [`ConnectionManager`] | `(TargetId, Role)` → port registry (hub only) |
//! | [`HubManager`] | Accepts client ports, routes directed and broadcast sends |
//! | [`ClientManager`] | Lazily connects to the hub, queues early sends |
//!
//! # Data Flow
//!
//! ```text
//! ClientManager::send_message
//!   → (queue until port open) → Port → HubManager → ListenerManager::notify
//!
//! HubManager::send_message(selector)
//!   → ConnectionManager lookup → Port(s) → ClientManager → ListenerManager::notify
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Hub and client builders.
pub mod builder;

/// Per-context client facade.
pub mod client;

/// Hub-side port registry.
pub mod connections;

/// Background-side coordinator.
pub mod hub;

/// Listener registry and dispatch.
pub mod listeners;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, HubBuilder};
pub use client::{ClientManager, ConnectionState};
pub use connections::{ConnectionManager, TargetConnections};
pub use hub::HubManager;
pub use listeners::{Listener, ListenerManager, Subscription, listener};
