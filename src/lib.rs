//! WebExtension messaging - typed publish/subscribe between extension contexts.
//!
//! This library lets independent execution contexts of a browser extension
//! exchange tagged messages through subscriptions instead of raw ports.
//!
//! # Architecture
//!
//! The layer follows a hub-and-spoke model:
//!
//! - **Hub (background)**: one [`HubManager`] accepts every client port,
//!   keyed by `(TargetId, Role)`, and can address one client, one target,
//!   one role, or everyone
//! - **Clients (panel, popup, settings)**: one [`ClientManager`] per
//!   context opens a single port named `"<role>:<targetId>"` on first send
//!
//! Key design principles:
//!
//! - Host APIs are injected through the [`transport::Host`] and
//!   [`transport::Port`] traits
//! - `send_message` and `subscribe` never fail; problems are reported to
//!   the [`logger::Logger`]
//! - No global singletons: hubs and clients are built and passed explicitly
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use webext_messaging::messaging::listener;
//! use webext_messaging::transport::MemoryHost;
//! use webext_messaging::{ClientManager, HubManager, Message, Result, Role, Selector, TargetId};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let host = Arc::new(MemoryHost::with_target_id(TargetId::new(1)));
//!
//!     let hub = HubManager::builder().host(host.clone()).build()?;
//!     let client = ClientManager::builder(Role::Popup).host(host).build()?;
//!
//!     let _sub = client.subscribe("greeting", listener(|message, _| {
//!         println!("hub says {}", message.data);
//!         Ok(())
//!     }));
//!
//!     client.send_message(Message::empty("hello"));
//!     client.wait_connected(Duration::from_secs(1)).await?;
//!
//!     hub.send_message(Selector::role(Role::Popup), Message::new("greeting", "hi".into()));
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`TargetId`], [`Role`], [`ConnectionKey`] |
//! | [`logger`] | Pluggable diagnostics sink |
//! | [`messaging`] | Hub, client, and their registries |
//! | [`protocol`] | [`Message`], [`Selector`], port naming |
//! | [`transport`] | Host capability traits and in-memory host |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers for messaging endpoints.
pub mod identifiers;

/// Pluggable logger.
pub mod logger;

/// Hub, client, listener and connection managers.
pub mod messaging;

/// Message and addressing types.
pub mod protocol;

/// Host capability traits and in-memory host.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionKey, Role, TargetId};

// Logger types
pub use logger::{Logger, LoggerHandle, TracingLogger};

// Messaging types
pub use messaging::{
    ClientManager, ConnectionManager, ConnectionState, HubManager, Listener, ListenerManager,
    Subscription,
};

// Protocol types
pub use protocol::{Message, Selector};
