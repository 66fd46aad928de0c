//! Hub-side registry of connected ports.
//!
//! Ports are keyed by target, then by role:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            ConnectionManager             │
//! │  TargetId=5 → [panel: Port, popup: Port, │
//! │                settings: -]              │
//! │  TargetId=7 → [panel: -, popup: Port,    │
//! │                settings: -]              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A target record exists only while at least one of its role slots is
//! occupied.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::identifiers::{ConnectionKey, Role, TargetId};
use crate::transport::PortHandle;

// ============================================================================
// TargetConnections
// ============================================================================

/// Role slots for one target.
#[derive(Debug, Clone, Default)]
pub struct TargetConnections {
    /// One slot per [`Role`], indexed in [`Role::ALL`] order.
    slots: [Option<PortHandle>; Role::COUNT],
}

impl TargetConnections {
    /// Returns the port registered for `role`.
    #[inline]
    #[must_use]
    pub fn get(&self, role: Role) -> Option<&PortHandle> {
        self.slots[role.index()].as_ref()
    }

    /// Returns `true` if no role slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of occupied role slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Iterates occupied slots in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &PortHandle)> {
        Role::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(role, slot)| slot.as_ref().map(|port| (role, port)))
    }

    /// Iterates roles with an occupied slot.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.iter().map(|(role, _)| role)
    }

    fn set(&mut self, role: Role, port: PortHandle) -> Option<PortHandle> {
        self.slots[role.index()].replace(port)
    }

    fn take(&mut self, role: Role) -> Option<PortHandle> {
        self.slots[role.index()].take()
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Registry mapping `(TargetId, Role)` to the active port.
///
/// Not synchronized; the hub keeps it behind a lock.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: FxHashMap<TargetId, TargetConnections>,
}

impl ConnectionManager {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `port` under `key`.
    ///
    /// Overwrites any port already registered for the key and returns it.
    pub fn add_connection(&mut self, key: ConnectionKey, port: PortHandle) -> Option<PortHandle> {
        self.connections
            .entry(key.target_id)
            .or_default()
            .set(key.role, port)
    }

    /// Removes the port registered under `key`.
    ///
    /// Drops the target record once its last role is removed. Missing keys
    /// are ignored.
    pub fn remove_connection(&mut self, key: ConnectionKey) -> Option<PortHandle> {
        let record = self.connections.get_mut(&key.target_id)?;
        let removed = record.take(key.role);

        if record.is_empty() {
            self.connections.remove(&key.target_id);
        }

        removed
    }

    /// Returns the port registered under `key`.
    #[inline]
    #[must_use]
    pub fn get_connection(&self, key: ConnectionKey) -> Option<PortHandle> {
        self.connections
            .get(&key.target_id)
            .and_then(|record| record.get(key.role))
            .map(Arc::clone)
    }

    /// Read-only view of the whole registry.
    #[inline]
    #[must_use]
    pub fn all_connections(&self) -> &FxHashMap<TargetId, TargetConnections> {
        &self.connections
    }

    /// Keys of every registered port.
    #[must_use]
    pub fn keys(&self) -> Vec<ConnectionKey> {
        self.connections
            .iter()
            .flat_map(|(target_id, record)| {
                record
                    .roles()
                    .map(|role| ConnectionKey::new(*target_id, role))
            })
            .collect()
    }

    /// Total number of registered ports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.values().map(TargetConnections::len).sum()
    }

    /// Returns `true` if no port is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::MemoryPort;

    fn port(name: &str) -> PortHandle {
        MemoryPort::pair(name).0
    }

    fn key(target: u32, role: Role) -> ConnectionKey {
        ConnectionKey::new(TargetId::new(target), role)
    }

    #[test]
    fn test_add_two_roles_same_target() {
        let mut manager = ConnectionManager::new();
        manager.add_connection(key(5, Role::Popup), port("popup:5"));
        manager.add_connection(key(5, Role::Panel), port("panel:5"));

        let record = &manager.all_connections()[&TargetId::new(5)];
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(Role::Popup).unwrap().name(), "popup:5");
        assert_eq!(record.get(Role::Panel).unwrap().name(), "panel:5");
        assert!(record.get(Role::Settings).is_none());
    }

    #[test]
    fn test_remove_one_keeps_other() {
        let mut manager = ConnectionManager::new();
        manager.add_connection(key(5, Role::Popup), port("popup:5"));
        manager.add_connection(key(5, Role::Panel), port("panel:5"));

        manager.remove_connection(key(5, Role::Popup));

        let record = &manager.all_connections()[&TargetId::new(5)];
        assert!(record.get(Role::Popup).is_none());
        assert!(record.get(Role::Panel).is_some());
    }

    #[test]
    fn test_remove_last_drops_target() {
        let mut manager = ConnectionManager::new();
        manager.add_connection(key(5, Role::Popup), port("popup:5"));
        manager.add_connection(key(5, Role::Panel), port("panel:5"));

        manager.remove_connection(key(5, Role::Popup));
        manager.remove_connection(key(5, Role::Panel));

        assert!(!manager.all_connections().contains_key(&TargetId::new(5)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_add_overwrites() {
        let mut manager = ConnectionManager::new();
        let first = port("popup:5");
        let second = port("popup:5");

        assert!(manager.add_connection(key(5, Role::Popup), Arc::clone(&first)).is_none());
        let replaced = manager.add_connection(key(5, Role::Popup), Arc::clone(&second));

        assert!(Arc::ptr_eq(&replaced.unwrap(), &first));
        let current = manager.get_connection(key(5, Role::Popup)).unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut manager = ConnectionManager::new();
        assert!(manager.remove_connection(key(1, Role::Settings)).is_none());

        manager.add_connection(key(1, Role::Panel), port("panel:1"));
        assert!(manager.remove_connection(key(1, Role::Settings)).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_get_connection_lookup() {
        let mut manager = ConnectionManager::new();
        manager.add_connection(key(3, Role::Settings), port("settings:3"));

        assert!(manager.get_connection(key(3, Role::Settings)).is_some());
        assert!(manager.get_connection(key(3, Role::Popup)).is_none());
        assert!(manager.get_connection(key(4, Role::Settings)).is_none());
    }

    #[test]
    fn test_keys_and_iter_order() {
        let mut manager = ConnectionManager::new();
        manager.add_connection(key(9, Role::Settings), port("settings:9"));
        manager.add_connection(key(9, Role::Panel), port("panel:9"));

        let roles: Vec<_> = manager.all_connections()[&TargetId::new(9)].roles().collect();
        assert_eq!(roles, vec![Role::Panel, Role::Settings]);

        let mut keys = manager.keys();
        keys.sort_by_key(|k| k.role);
        assert_eq!(keys, vec![key(9, Role::Panel), key(9, Role::Settings)]);
    }
}
