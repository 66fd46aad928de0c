//! Port naming contract.
//!
//! A client opens its port under the name `"<role>:<targetId>"`, e.g.
//! `popup:42`. The hub parses the name positionally to learn who connected,
//! so this format is the only compatibility surface between the two sides.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionKey, Role, TargetId};

// ============================================================================
// Constants
// ============================================================================

/// Separator between role and target id.
pub const NAME_SEPARATOR: char = ':';

// ============================================================================
// Formatting
// ============================================================================

impl ConnectionKey {
    /// Returns the port name for this key.
    #[inline]
    #[must_use]
    pub fn port_name(&self) -> String {
        self.to_string()
    }

    /// Parses a port name into a key.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConnectionName`] if the separator is missing
    /// - [`Error::UnknownRole`] if the role token is not recognized
    /// - [`Error::InvalidTargetId`] if the target id is not a decimal `u32`
    pub fn parse_port_name(name: &str) -> Result<Self> {
        let (role, target_id) = name
            .split_once(NAME_SEPARATOR)
            .ok_or_else(|| Error::invalid_connection_name(name, "missing ':' separator"))?;

        let role = role.parse::<Role>()?;
        let target_id = target_id.parse::<TargetId>()?;

        Ok(Self::new(target_id, role))
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.role, NAME_SEPARATOR, self.target_id)
    }
}

impl FromStr for ConnectionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_port_name(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
