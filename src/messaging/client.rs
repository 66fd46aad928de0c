//! Per-context client facade.
//!
//! A [`ClientManager`] owns at most one port to the hub. The port is opened
//! lazily by the first [`send_message`](ClientManager::send_message);
//! messages sent before it exists are queued and flushed in order once it
//! does.
//!
//! # States
//!
//! ```text
//! Unconnected ──send──► Connecting ──queue drained──► Connected
//!      ▲                    │                             │
//!      └──target unresolved─┘                             │
//!      └─────────────────────disconnect───────────────────┘
//! ```
//!
//! On disconnect every local subscription is dropped; callers resubscribe
//! after reconnecting.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionKey, Role, TargetId};
use crate::logger::LoggerHandle;
use crate::protocol::Message;
use crate::transport::{HostHandle, PortHandle};

use super::builder::ClientBuilder;
use super::listeners::{Listener, ListenerManager, Subscription};

// ============================================================================
// ConnectionState
// ============================================================================

/// Client connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No port and no establishment in flight.
    Unconnected,
    /// Resolving the target id, or draining the queue into a fresh port.
    Connecting,
    /// Port open and queue drained.
    Connected,
}

// ============================================================================
// ClientState
// ============================================================================

/// Mutable client state.
#[derive(Default)]
struct ClientState {
    /// Open port, if any.
    port: Option<PortHandle>,
    /// Target the port was opened for.
    target_id: Option<TargetId>,
    /// Messages waiting for a port.
    pending: VecDeque<Message>,
    /// Establishment in flight.
    connecting: bool,
    /// Port open but the queue is still draining; new sends keep queueing.
    flushing: bool,
    /// Bumped per opened port; stale handlers compare against it.
    generation: u64,
}

impl ClientState {
    fn connection_state(&self) -> ConnectionState {
        if self.port.is_some() && !self.flushing {
            ConnectionState::Connected
        } else if self.connecting || self.flushing {
            ConnectionState::Connecting
        } else {
            ConnectionState::Unconnected
        }
    }
}

// ============================================================================
// ClientInner
// ============================================================================

/// Shared state behind a [`ClientManager`].
struct ClientInner {
    /// Role encoded in the port name.
    role: Role,
    /// Host used to resolve the target and open the port.
    host: HostHandle,
    /// Diagnostics sink.
    logger: LoggerHandle,
    /// Subscribers for inbound messages.
    listeners: ListenerManager,
    /// Port and queue.
    state: Mutex<ClientState>,
    /// Publishes [`ConnectionState`] changes.
    state_tx: watch::Sender<ConnectionState>,
}

// ============================================================================
// ClientManager
// ============================================================================

/// Client-side messaging facade.
///
/// Cloning yields another handle to the same client.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use webext_messaging::transport::MemoryHost;
/// use webext_messaging::messaging::listener;
/// use webext_messaging::{ClientManager, Message, Role, TargetId};
///
/// # async fn example() -> webext_messaging::Result<()> {
/// let host = Arc::new(MemoryHost::with_target_id(TargetId::new(1)));
/// let client = ClientManager::builder(Role::Popup).host(host).build()?;
///
/// let _sub = client.subscribe("refresh", listener(|_, _| Ok(())));
/// client.send_message(Message::empty("hello"));
/// client.wait_connected(Duration::from_secs(1)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientManager {
    inner: Arc<ClientInner>,
}

// ============================================================================
// ClientManager - Constructor
// ============================================================================

impl ClientManager {
    /// Returns a builder for a client with the given role.
    #[inline]
    #[must_use]
    pub fn builder(role: Role) -> ClientBuilder {
        ClientBuilder::new(role)
    }

    /// Creates an unconnected client.
    #[must_use]
    pub fn new(role: Role, host: HostHandle, logger: LoggerHandle) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Unconnected);

        Self {
            inner: Arc::new(ClientInner {
                role,
                host,
                listeners: ListenerManager::new(Arc::clone(&logger)),
                logger,
                state: Mutex::new(ClientState::default()),
                state_tx,
            }),
        }
    }
}

// ============================================================================
// ClientManager - Public API
// ============================================================================

impl ClientManager {
    /// Subscribes to inbound messages of `message_type` from the hub.
    pub fn subscribe(&self, message_type: impl Into<String>, listener: Listener) -> Subscription {
        self.inner.listeners.subscribe(message_type, listener)
    }

    /// Sends `message` to the hub.
    ///
    /// Posts immediately when a port is open and the queue is drained.
    /// Otherwise queues the message behind everything sent before it and
    /// starts connecting, unless a connection attempt is already in flight.
    /// Never blocks.
    pub fn send_message(&self, message: Message) {
        let mut state = self.inner.state.lock();

        if !state.flushing
            && let Some(port) = state.port.clone()
        {
            drop(state);
            port.post_message(&message);
            return;
        }

        state.pending.push_back(message);
        trace!(pending = state.pending.len(), "Message queued");

        if state.flushing {
            return;
        }

        let start = !state.connecting;
        state.connecting = true;
        drop(state);

        if start {
            self.inner.publish_state();
            self.spawn_establish();
        }
    }

    /// Starts connecting without sending anything.
    ///
    /// No-op when connected or already connecting.
    pub fn connect(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.port.is_some() || state.connecting {
                return;
            }
            state.connecting = true;
        }

        self.inner.publish_state();
        self.spawn_establish();
    }

    /// Closes the port from this side.
    ///
    /// Performs the same cleanup as a hub-initiated disconnect.
    pub fn disconnect(&self) {
        let port = {
            let mut state = self.inner.state.lock();
            state.target_id = None;
            state.flushing = false;
            state.port.take()
        };

        if let Some(port) = port {
            port.disconnect();
            self.inner.on_closed(port.name());
        }
    }

    /// Waits until the client is connected.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if not connected within `wait`
    /// - [`Error::ConnectionClosed`] if the client is dropped while waiting
    pub async fn wait_connected(&self, wait: Duration) -> Result<()> {
        let mut rx = self.inner.state_tx.subscribe();

        let connected = async move {
            rx.wait_for(|state| *state == ConnectionState::Connected)
                .await
                .map(|_| ())
        };

        match timeout(wait, connected).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::connection_timeout(saturating_millis(wait))),
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().connection_state()
    }

    /// Returns `true` once a port is open and the queue is drained.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of queued messages.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Role this client connects as.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Target the open port belongs to.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> Option<TargetId> {
        self.inner.state.lock().target_id
    }

    /// Listener registry, for inspection.
    #[inline]
    #[must_use]
    pub fn listeners(&self) -> &ListenerManager {
        &self.inner.listeners
    }

    /// Runs establishment on the current tokio runtime.
    fn spawn_establish(&self) {
        match Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(inner.establish());
            }
            Err(e) => {
                self.inner.state.lock().connecting = false;
                self.inner.publish_state();
                self.inner.logger.error(
                    "Cannot connect without a tokio runtime",
                    Some(&json!({ "role": self.inner.role, "error": e.to_string() })),
                );
            }
        }
    }
}

// ============================================================================
// ClientInner - Connection Handling
// ============================================================================

impl ClientInner {
    /// Resolves the target, opens the port and flushes the queue.
    async fn establish(self: Arc<Self>) {
        let Some(target_id) = self.host.resolve_target_id().await else {
            self.state.lock().connecting = false;
            self.publish_state();
            self.logger.error(
                "Failed to resolve target id",
                Some(&json!({ "role": self.role })),
            );
            return;
        };

        let key = ConnectionKey::new(target_id, self.role);
        let name = key.port_name();
        let port = self.host.connect(&name);

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };

        let inner = Arc::downgrade(&self);
        port.on_message(Box::new(move |message| {
            if let Some(inner) = inner.upgrade() {
                inner.handle_message(generation, &message);
            }
        }));

        let inner = Arc::downgrade(&self);
        port.on_disconnect(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.handle_disconnect(generation);
            }
        }));

        let pending = {
            let mut state = self.state.lock();
            state.port = Some(Arc::clone(&port));
            state.target_id = Some(target_id);
            state.connecting = false;
            state.flushing = true;
            state.pending.len()
        };

        if pending > 0 {
            debug!(count = pending, name = %name, "Flushing queued messages");
        }

        if self.flush(generation, &port) {
            self.publish_state();
            self.logger.info("Connected to hub", Some(&json!({ "name": name })));
        }
    }

    /// Drains the queue into `port` one message at a time.
    ///
    /// Sends made while draining, including re-entrant ones from listeners,
    /// land at the back of the queue and go out in order. Returns `false`
    /// if the port was replaced or closed before the queue emptied.
    fn flush(&self, generation: u64, port: &PortHandle) -> bool {
        loop {
            let message = {
                let mut state = self.state.lock();
                if state.generation != generation || state.port.is_none() {
                    return false;
                }
                match state.pending.pop_front() {
                    Some(message) => message,
                    None => {
                        state.flushing = false;
                        return true;
                    }
                }
            };

            port.post_message(&message);
        }
    }

    /// Forwards an inbound message to local listeners.
    fn handle_message(&self, generation: u64, message: &Message) {
        let port = {
            let state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.port.clone()
        };

        if let Some(port) = port {
            self.listeners.notify(message, Some(&port));
        }
    }

    /// Cleans up after the hub closed the port.
    fn handle_disconnect(&self, generation: u64) {
        let port = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.target_id = None;
            state.flushing = false;
            state.port.take()
        };

        if let Some(port) = port {
            self.on_closed(port.name());
        }
    }

    /// Shared teardown for both disconnect directions.
    fn on_closed(&self, name: &str) {
        self.listeners.clear();
        self.publish_state();
        self.logger
            .info("Disconnected from hub", Some(&json!({ "name": name })));
    }

    fn publish_state(&self) {
        let state = self.state.lock().connection_state();
        self.state_tx.send_replace(state);
    }
}

/// Whole milliseconds in `wait`, capped at `u64::MAX`.
fn saturating_millis(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// ClientManager - Display
// ============================================================================

impl fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientManager")
            .field("role", &self.inner.role)
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
