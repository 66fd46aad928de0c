//! Message and addressing types.
//!
//! # Protocol Overview
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Message`] | `{type, data}` payload posted over a port |
//! | [`Selector`] | Hub-side destination constraints |
//! | port name | `"<role>:<targetId>"`, see [`ConnectionKey::port_name`](crate::ConnectionKey::port_name) |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Tagged message type |
//! | `name` | Port naming contract |
//! | `selector` | Hub addressing modes |

// ============================================================================
// Submodules
// ============================================================================

/// Tagged message type.
pub mod message;

/// Port naming contract.
pub mod name;

/// Hub addressing modes.
pub mod selector;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::Message;
pub use name::NAME_SEPARATOR;
pub use selector::Selector;
