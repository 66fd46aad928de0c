//! In-process host implementation.
//!
//! [`MemoryHost`] links ports directly in memory, with the same observable
//! behaviour as a browser runtime:
//!
//! - `connect(name)` returns the local end and announces the remote end to
//!   every connect handler
//! - posting delivers synchronously to the peer's message handlers
//! - `disconnect()` fires the peer's disconnect handlers, never the caller's
//!
//! Used by the test suite and handy for running hub and client logic in a
//! single process.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use webext_messaging::TargetId;
//! use webext_messaging::transport::MemoryHost;
//!
//! let host = Arc::new(MemoryHost::with_target_id(TargetId::new(7)));
//! let port = host.open("popup:7");
//! assert!(port.is_connected());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::identifiers::TargetId;
use crate::protocol::Message;

use super::port::{
    ConnectHandler, DisconnectHandler, Host, MessageHandler, Port, PortHandle,
};

// ============================================================================
// Types
// ============================================================================

type SharedMessageHandler = Arc<dyn Fn(Message) + Send + Sync>;
type SharedDisconnectHandler = Arc<dyn Fn() + Send + Sync>;
type SharedConnectHandler = Arc<dyn Fn(PortHandle) + Send + Sync>;

// ============================================================================
// MemoryPort
// ============================================================================

/// One end of an in-memory port pair.
pub struct MemoryPort {
    /// Name shared by both ends.
    name: String,
    /// Mutable state.
    state: Mutex<PortState>,
}

#[derive(Default)]
struct PortState {
    /// The other end, if still linked.
    peer: Option<Weak<MemoryPort>>,
    /// `false` once either end disconnected.
    connected: bool,
    message_handlers: Vec<SharedMessageHandler>,
    disconnect_handlers: Vec<SharedDisconnectHandler>,
    /// Messages posted from this end.
    sent: Vec<Message>,
    /// Messages delivered to this end.
    received: Vec<Message>,
}

impl MemoryPort {
    /// Creates a linked pair of ports sharing `name`.
    ///
    /// Returns `(local, remote)`.
    #[must_use]
    pub fn pair(name: impl Into<String>) -> (Arc<Self>, Arc<Self>) {
        let name = name.into();
        let local = Arc::new(Self::unlinked(name.clone()));
        let remote = Arc::new(Self::unlinked(name));

        local.link(&remote);
        remote.link(&local);

        (local, remote)
    }

    fn unlinked(name: String) -> Self {
        Self {
            name,
            state: Mutex::new(PortState::default()),
        }
    }

    fn link(&self, peer: &Arc<Self>) {
        let mut state = self.state.lock();
        state.peer = Some(Arc::downgrade(peer));
        state.connected = true;
    }

    /// Returns `true` until either end disconnects.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Messages posted from this end, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Message> {
        self.state.lock().sent.clone()
    }

    /// Messages delivered to this end, in order.
    #[must_use]
    pub fn received(&self) -> Vec<Message> {
        self.state.lock().received.clone()
    }

    /// Delivers a message posted by the peer.
    fn deliver(&self, message: &Message) {
        let handlers = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.received.push(message.clone());
            state.message_handlers.clone()
        };

        for handler in handlers {
            handler(message.clone());
        }
    }

    /// Tears down this end after the peer disconnected.
    fn peer_disconnected(&self) {
        let handlers = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.peer = None;
            state.message_handlers.clear();
            std::mem::take(&mut state.disconnect_handlers)
        };

        debug!(name = %self.name, "Memory port peer disconnected");

        for handler in handlers {
            handler();
        }
    }
}

impl Port for MemoryPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn post_message(&self, message: &Message) {
        let peer = {
            let mut state = self.state.lock();
            if !state.connected {
                trace!(name = %self.name, "Post on disconnected port dropped");
                return;
            }
            state.sent.push(message.clone());
            state.peer.as_ref().and_then(Weak::upgrade)
        };

        match peer {
            Some(peer) => peer.deliver(message),
            None => trace!(name = %self.name, "Peer dropped, message discarded"),
        }
    }

    fn on_message(&self, handler: MessageHandler) {
        self.state.lock().message_handlers.push(Arc::from(handler));
    }

    fn on_disconnect(&self, handler: DisconnectHandler) {
        self.state.lock().disconnect_handlers.push(Arc::from(handler));
    }

    fn disconnect(&self) {
        let peer = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.message_handlers.clear();
            state.disconnect_handlers.clear();
            state.peer.take().and_then(|peer| peer.upgrade())
        };

        debug!(name = %self.name, "Memory port disconnected");

        if let Some(peer) = peer {
            peer.peer_disconnected();
        }
    }
}

impl fmt::Debug for MemoryPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPort")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MemoryHost
// ============================================================================

/// In-process [`Host`].
#[derive(Default)]
pub struct MemoryHost {
    /// Handlers registered through [`Host::on_connect`].
    connect_handlers: Mutex<Vec<SharedConnectHandler>>,
    /// Value returned by [`Host::resolve_target_id`].
    target_id: Mutex<Option<TargetId>>,
    /// Every local end handed out by `connect`, in order. Never pruned, so
    /// tests can inspect ports after the client dropped them.
    ports: Mutex<Vec<Arc<MemoryPort>>>,
}

impl MemoryHost {
    /// Creates a host that cannot resolve a target id.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host that resolves to `target_id`.
    #[must_use]
    pub fn with_target_id(target_id: TargetId) -> Self {
        let host = Self::default();
        host.set_target_id(Some(target_id));
        host
    }

    /// Changes the value returned by target id resolution.
    pub fn set_target_id(&self, target_id: Option<TargetId>) {
        *self.target_id.lock() = target_id;
    }

    /// Opens a port and returns the concrete local end.
    ///
    /// The remote end is passed to every connect handler.
    pub fn open(&self, name: &str) -> Arc<MemoryPort> {
        let (local, remote) = MemoryPort::pair(name);
        self.ports.lock().push(Arc::clone(&local));

        let handlers = self.connect_handlers.lock().clone();
        debug!(name, handlers = handlers.len(), "Memory port opened");

        for handler in handlers {
            handler(Arc::clone(&remote) as PortHandle);
        }

        local
    }

    /// Number of ports opened so far.
    #[inline]
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.ports.lock().len()
    }

    /// Local ends handed out so far, in order.
    ///
    /// The host keeps a strong handle to each of them for its whole
    /// lifetime; a long-running process should use a real [`Host`].
    #[must_use]
    pub fn ports(&self) -> Vec<Arc<MemoryPort>> {
        self.ports.lock().clone()
    }

    /// Most recently opened local end.
    #[must_use]
    pub fn last_port(&self) -> Option<Arc<MemoryPort>> {
        self.ports.lock().last().cloned()
    }
}

#[async_trait]
impl Host for MemoryHost {
    fn connect(&self, name: &str) -> PortHandle {
        self.open(name)
    }

    fn on_connect(&self, handler: ConnectHandler) {
        self.connect_handlers.lock().push(Arc::from(handler));
    }

    async fn resolve_target_id(&self) -> Option<TargetId> {
        *self.target_id.lock()
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("target_id", &*self.target_id.lock())
            .field("connect_count", &self.connect_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
