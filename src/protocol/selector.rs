//! Hub-side addressing.
//!
//! | Selector | Delivered to |
//! |----------|--------------|
//! | `{ target, role }` | exactly one port |
//! | `{ target }` | every role of one target |
//! | `{ role }` | one role across all targets |
//! | `{}` | every registered port |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{ConnectionKey, Role, TargetId};

// ============================================================================
// Selector
// ============================================================================

/// Constraints used by the hub to pick destination ports.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    /// Restrict delivery to one target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<TargetId>,

    /// Restrict delivery to one role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Selector {
    /// Matches every registered port.
    #[inline]
    #[must_use]
    pub const fn all() -> Self {
        Self {
            target_id: None,
            role: None,
        }
    }

    /// Matches every role of one target.
    #[inline]
    #[must_use]
    pub const fn target(target_id: TargetId) -> Self {
        Self {
            target_id: Some(target_id),
            role: None,
        }
    }

    /// Matches one role across all targets.
    #[inline]
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self {
            target_id: None,
            role: Some(role),
        }
    }

    /// Matches exactly one port.
    #[inline]
    #[must_use]
    pub const fn exact(target_id: TargetId, role: Role) -> Self {
        Self {
            target_id: Some(target_id),
            role: Some(role),
        }
    }
}

impl From<ConnectionKey> for Selector {
    #[inline]
    fn from(key: ConnectionKey) -> Self {
        Self::exact(key.target_id, key.role)
    }
}

// ============================================================================
// Tests
// ============================================================================
