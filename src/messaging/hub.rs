//! Background-side coordinator.
//!
//! One [`HubManager`] lives for the lifetime of the hub context. It accepts
//! every port opened towards the hub, registers it by the `(target, role)`
//! pair encoded in the port name, and routes messages both ways.
//!
//! # Connection Flow
//!
//! 1. Client opens a port named `"<role>:<targetId>"`
//! 2. Host fires the hub's connect handler
//! 3. Name is parsed; malformed names are logged and the port is ignored
//! 4. Port is registered and instrumented (inbound → listeners,
//!    disconnect → unregister)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use webext_messaging::transport::MemoryHost;
//! use webext_messaging::messaging::listener;
//! use webext_messaging::{HubManager, Message, Role, Selector};
//!
//! # fn example() -> webext_messaging::Result<()> {
//! let host = Arc::new(MemoryHost::new());
//! let hub = HubManager::builder().host(host.clone()).build()?;
//!
//! let _sub = hub.subscribe("status", listener(|message, sender| {
//!     println!("{:?} from {:?}", message.data, sender.map(|p| p.name()));
//!     Ok(())
//! }));
//!
//! hub.send_message(Selector::role(Role::Popup), Message::empty("refresh"));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, trace};

use crate::identifiers::{ConnectionKey, TargetId};
use crate::logger::LoggerHandle;
use crate::protocol::{Message, Selector};
use crate::transport::{HostHandle, PortHandle};

use super::builder::HubBuilder;
use super::connections::ConnectionManager;
use super::listeners::{Listener, ListenerManager, Subscription};

// ============================================================================
// HubInner
// ============================================================================

/// Shared state behind a [`HubManager`].
struct HubInner {
    /// Diagnostics sink.
    logger: LoggerHandle,
    /// Subscribers for inbound messages.
    listeners: ListenerManager,
    /// Connected ports.
    connections: Mutex<ConnectionManager>,
}

// ============================================================================
// HubManager
// ============================================================================

/// Hub-side messaging facade.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone)]
pub struct HubManager {
    inner: Arc<HubInner>,
}

// ============================================================================
// HubManager - Constructor
// ============================================================================

impl HubManager {
    /// Returns a builder for configuring a hub.
    #[inline]
    #[must_use]
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    /// Creates a hub and registers its connect handler with `host`.
    ///
    /// The handler stays registered for the lifetime of the host.
    #[must_use]
    pub fn new(host: HostHandle, logger: LoggerHandle) -> Self {
        let inner = Arc::new(HubInner {
            listeners: ListenerManager::new(Arc::clone(&logger)),
            logger,
            connections: Mutex::new(ConnectionManager::new()),
        });

        let handler_inner = Arc::clone(&inner);
        host.on_connect(Box::new(move |port| {
            HubInner::handle_connect(&handler_inner, port);
        }));

        debug!("Hub listening for connections");

        Self { inner }
    }
}

// ============================================================================
// HubManager - Public API
// ============================================================================

impl HubManager {
    /// Subscribes to inbound messages of `message_type` from any client.
    pub fn subscribe(&self, message_type: impl Into<String>, listener: Listener) -> Subscription {
        self.inner.listeners.subscribe(message_type, listener)
    }

    /// Posts `message` to every port matching `selector`.
    ///
    /// Targets or roles without a live port are skipped silently.
    pub fn send_message(&self, selector: impl Into<Selector>, message: Message) {
        let selector = selector.into();
        let ports = self.select(selector);

        trace!(
            message_type = %message.message_type,
            target_id = ?selector.target_id,
            role = ?selector.role,
            count = ports.len(),
            "Hub sending message"
        );

        for port in ports {
            port.post_message(&message);
        }
    }

    /// Posts `message` to the port registered under `key`, if any.
    #[inline]
    pub fn send_to(&self, key: ConnectionKey, message: Message) {
        self.send_message(key, message);
    }

    /// Returns the port registered under `key`.
    #[must_use]
    pub fn connection(&self, key: ConnectionKey) -> Option<PortHandle> {
        self.inner.connections.lock().get_connection(key)
    }

    /// Keys of every connected client.
    #[must_use]
    pub fn connection_keys(&self) -> Vec<ConnectionKey> {
        self.inner.connections.lock().keys()
    }

    /// Number of connected clients.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    /// Resolves `selector` against the registry.
    fn select(&self, selector: Selector) -> Vec<PortHandle> {
        let connections = self.inner.connections.lock();
        let registry = connections.all_connections();

        let targets: Vec<TargetId> = match selector.target_id {
            Some(target_id) => vec![target_id],
            None => registry.keys().copied().collect(),
        };

        let mut ports = Vec::new();

        for target_id in targets {
            let Some(record) = registry.get(&target_id) else {
                continue;
            };

            match selector.role {
                Some(role) => ports.extend(record.get(role).map(Arc::clone)),
                None => ports.extend(record.iter().map(|(_, port)| Arc::clone(port))),
            }
        }

        ports
    }
}

// ============================================================================
// HubInner - Connection Handling
// ============================================================================

impl HubInner {
    /// Registers and instruments a newly opened port.
    fn handle_connect(this: &Arc<Self>, port: PortHandle) {
        let name = port.name().to_string();

        let key = match ConnectionKey::parse_port_name(&name) {
            Ok(key) => key,
            Err(e) => {
                this.logger.error(
                    "Rejected connection with invalid name",
                    Some(&json!({ "name": name, "error": e.to_string() })),
                );
                return;
            }
        };

        let replaced = this
            .connections
            .lock()
            .add_connection(key, Arc::clone(&port));

        if replaced.is_some() {
            debug!(name = %name, "Replaced existing connection");
        }

        this.logger.info(
            "Client connected",
            Some(&json!({ "name": name, "targetId": key.target_id, "role": key.role })),
        );

        // The registry entry owns the port; its handlers only point back.
        let inner = Arc::downgrade(this);
        let sender = Arc::downgrade(&port);
        port.on_message(Box::new(move |message| {
            if let (Some(inner), Some(sender)) = (inner.upgrade(), sender.upgrade()) {
                inner.listeners.notify(&message, Some(&sender));
            }
        }));

        let inner = Arc::downgrade(this);
        let closed = Arc::downgrade(&port);
        port.on_disconnect(Box::new(move || {
            if let (Some(inner), Some(closed)) = (inner.upgrade(), closed.upgrade()) {
                inner.handle_disconnect(key, &closed);
            }
        }));
    }

    /// Unregisters a port whose client went away.
    fn handle_disconnect(&self, key: ConnectionKey, port: &PortHandle) {
        {
            let mut connections = self.connections.lock();
            // A newer port may have taken over the key.
            let current = connections.get_connection(key);
            if current.is_some_and(|current| Arc::ptr_eq(&current, port)) {
                connections.remove_connection(key);
            }
        }

        self.logger.info(
            "Client disconnected",
            Some(&json!({ "name": port.name(), "targetId": key.target_id, "role": key.role })),
        );
    }
}

// ============================================================================
// HubManager - Display
// ============================================================================

impl fmt::Debug for HubManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubManager")
            .field("connections", &self.connection_count())
            .field("listeners", &self.inner.listeners)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::json;

    use crate::identifiers::Role;
    use crate::logger::testing::{Level, RecordingLogger};
    use crate::messaging::listener;
    use crate::transport::{MemoryHost, MemoryPort, Port};

    struct Fixture {
        host: Arc<MemoryHost>,
        logger: Arc<RecordingLogger>,
        hub: HubManager,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(MemoryHost::new());
        let logger = RecordingLogger::new();
        let hub = HubManager::new(host.clone(), logger.clone());
        Fixture { host, logger, hub }
    }

    fn key(target: u32, role: Role) -> ConnectionKey {
        ConnectionKey::new(TargetId::new(target), role)
    }

    fn names(ports: &[Arc<MemoryPort>]) -> Vec<String> {
        ports
            .iter()
            .filter(|port| !port.received().is_empty())
            .map(|port| port.name().to_string())
            .collect()
    }

    #[test]
    fn test_valid_name_registers() {
        let f = fixture();
        f.host.open("popup:42");

        assert_eq!(f.hub.connection_keys(), vec![key(42, Role::Popup)]);
        assert!(f.hub.connection(key(42, Role::Popup)).is_some());
        assert_eq!(f.logger.count(Level::Info), 1);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let f = fixture();
        f.host.open("bogus:42");
        f.host.open("popup:abc");
        f.host.open("popup");

        assert_eq!(f.hub.connection_count(), 0);
        assert_eq!(f.logger.count(Level::Error), 3);
    }

    #[test]
    fn test_rejected_port_is_not_instrumented() {
        let f = fixture();
        let hits = Arc::new(parking_lot::Mutex::new(0));
        let counter = Arc::clone(&hits);
        let _sub = f.hub.subscribe(
            "ping",
            listener(move |_, _| {
                *counter.lock() += 1;
                Ok(())
            }),
        );

        let port = f.host.open("bogus:1");
        port.post_message(&Message::empty("ping"));

        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn test_inbound_reaches_listeners_with_sender() {
        let f = fixture();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let _sub = f.hub.subscribe(
            "status",
            listener(move |message, sender| {
                record.lock().push((
                    message.data.clone(),
                    sender.map(|port| port.name().to_string()),
                ));
                Ok(())
            }),
        );

        let port = f.host.open("panel:3");
        port.post_message(&Message::new("status", json!("ok")));

        assert_eq!(
            *seen.lock(),
            vec![(json!("ok"), Some("panel:3".to_string()))]
        );
    }

    #[test]
    fn test_unmatched_inbound_warns() {
        let f = fixture();
        let port = f.host.open("panel:3");
        port.post_message(&Message::empty("unknown"));

        assert_eq!(f.logger.count(Level::Warn), 1);
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let f = fixture();
        let ports = vec![
            f.host.open("popup:1"),
            f.host.open("panel:1"),
            f.host.open("popup:2"),
            f.host.open("settings:3"),
        ];

        f.hub.send_message(Selector::all(), Message::empty("hello"));

        for port in &ports {
            assert_eq!(port.received(), vec![Message::empty("hello")]);
        }
    }

    #[test]
    fn test_target_broadcast() {
        let f = fixture();
        let ports = vec![
            f.host.open("popup:7"),
            f.host.open("panel:7"),
            f.host.open("popup:8"),
        ];

        f.hub
            .send_message(Selector::target(TargetId::new(7)), Message::empty("hi"));

        assert_eq!(names(&ports), vec!["popup:7", "panel:7"]);
    }

    #[test]
    fn test_role_broadcast() {
        let f = fixture();
        let ports = vec![
            f.host.open("popup:7"),
            f.host.open("panel:7"),
            f.host.open("popup:8"),
            f.host.open("settings:8"),
        ];

        f.hub.send_message(Selector::role(Role::Popup), Message::empty("hi"));

        assert_eq!(names(&ports), vec!["popup:7", "popup:8"]);
    }

    #[test]
    fn test_exact_addressing() {
        let f = fixture();
        let ports = vec![f.host.open("popup:7"), f.host.open("panel:7")];

        f.hub.send_to(key(7, Role::Panel), Message::empty("hi"));

        assert_eq!(names(&ports), vec!["panel:7"]);
    }

    #[test]
    fn test_missing_target_or_role_is_silent() {
        let f = fixture();
        let port = f.host.open("popup:7");

        f.hub
            .send_message(Selector::target(TargetId::new(99)), Message::empty("x"));
        f.hub
            .send_message(Selector::exact(TargetId::new(7), Role::Settings), Message::empty("x"));

        assert!(port.received().is_empty());
        assert!(f.logger.entries().iter().all(|e| e.level == Level::Info));
    }

    #[test]
    fn test_disconnect_removes_only_that_entry() {
        let f = fixture();
        let popup = f.host.open("popup:5");
        let _panel = f.host.open("panel:5");

        popup.disconnect();

        assert_eq!(f.hub.connection_keys(), vec![key(5, Role::Panel)]);
        assert_eq!(f.logger.count(Level::Info), 3);
    }

    #[test]
    fn test_stale_disconnect_keeps_newer_port() {
        let f = fixture();
        let old = f.host.open("popup:5");
        let new = f.host.open("popup:5");

        old.disconnect();

        assert_eq!(f.hub.connection_count(), 1);
        f.hub.send_to(key(5, Role::Popup), Message::empty("hi"));
        assert_eq!(new.received().len(), 1);
    }

    #[test]
    fn test_disconnected_port_is_released() {
        let f = fixture();
        let local = f.host.open("panel:6");
        let remote = f
            .hub
            .connection(key(6, Role::Panel))
            .map(|port| Arc::downgrade(&port));

        local.disconnect();

        assert_eq!(f.hub.connection_count(), 0);
        assert!(remote.is_some_and(|port| port.upgrade().is_none()));
    }

    #[test]
    fn test_listener_can_reply_through_hub() {
        let f = fixture();
        let hub = f.hub.clone();
        let _sub = f.hub.subscribe(
            "ping",
            listener(move |_, sender| {
                if let Some(port) = sender
                    && let Ok(key) = ConnectionKey::parse_port_name(port.name())
                {
                    hub.send_to(key, Message::empty("pong"));
                }
                Ok(())
            }),
        );

        let port = f.host.open("settings:2");
        port.post_message(&Message::empty("ping"));

        assert_eq!(port.received(), vec![Message::empty("pong")]);
    }
}
