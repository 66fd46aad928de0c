//! Type-safe identifiers for messaging endpoints.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TargetId`] | Host-assigned context id (e.g. a browser tab) |
//! | [`Role`] | Logical client category |
//! | [`ConnectionKey`] | `(TargetId, Role)` pair addressing one port on the hub |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// TargetId
// ============================================================================

/// Identifier of an addressable host context, such as a browser tab.
///
/// Assigned by the host; the messaging layer only compares and hashes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(u32);

impl TargetId {
    /// Creates a target id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for TargetId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetId {
    type Err = Error;

    /// Parses the decimal form used in port names.
    ///
    /// Only ASCII digits are accepted: no sign, no whitespace.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_target_id(s));
        }

        s.parse::<u32>()
            .map(Self)
            .map_err(|_| Error::invalid_target_id(s))
    }
}

// ============================================================================
// Role
// ============================================================================

/// Logical category of a client context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Side or devtools panel.
    Panel,
    /// Toolbar popup.
    Popup,
    /// Options/settings page.
    Settings,
}

impl Role {
    /// Every recognized role, in slot order.
    pub const ALL: [Role; 3] = [Role::Panel, Role::Popup, Role::Settings];

    /// Number of recognized roles.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the token used in port names.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Panel => "panel",
            Self::Popup => "popup",
            Self::Settings => "settings",
        }
    }

    /// Position of this role in [`Role::ALL`].
    #[inline]
    pub(crate) const fn index(&self) -> usize {
        match self {
            Self::Panel => 0,
            Self::Popup => 1,
            Self::Settings => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Parses a role token. Matching is exact and case-sensitive.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::unknown_role(s))
    }
}

// ============================================================================
// ConnectionKey
// ============================================================================

/// Address of one port on the hub side.
///
/// At most one port is registered per key at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionKey {
    /// Host context the client belongs to.
    pub target_id: TargetId,
    /// Client category.
    pub role: Role,
}

impl ConnectionKey {
    /// Creates a new connection key.
    #[inline]
    #[must_use]
    pub const fn new(target_id: TargetId, role: Role) -> Self {
        Self { target_id, role }
    }
}

// ============================================================================
// Tests
// ============================================================================
