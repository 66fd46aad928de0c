//! Host transport layer.
//!
//! This module defines the capabilities the messaging layer consumes from
//! its host, plus an in-memory implementation of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client context │                              │  Hub context    │
//! │  (popup, panel) │            Port              │  (background)   │
//! │                 │◄────────────────────────────►│                 │
//! │  Host::connect  │      "<role>:<targetId>"     │ Host::on_connect│
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `port` | [`Port`] and [`Host`] capability traits |
//! | `memory` | In-process [`MemoryHost`] and [`MemoryPort`] |

// ============================================================================
// Submodules
// ============================================================================

/// In-process host implementation.
pub mod memory;

/// Host capability traits.
pub mod port;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryHost, MemoryPort};
pub use port::{
    ConnectHandler, DisconnectHandler, Host, HostHandle, MessageHandler, Port, PortHandle,
};
