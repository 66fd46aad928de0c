//! Builders for hub and client configuration.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use webext_messaging::logger::NoopLogger;
//! use webext_messaging::transport::MemoryHost;
//! use webext_messaging::{ClientManager, HubManager, Role};
//!
//! # fn example() -> webext_messaging::Result<()> {
//! let host = Arc::new(MemoryHost::new());
//!
//! let hub = HubManager::builder()
//!     .host(host.clone())
//!     .logger(Arc::new(NoopLogger))
//!     .build()?;
//!
//! let client = ClientManager::builder(Role::Popup)
//!     .host(host)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::identifiers::Role;
use crate::logger::{LoggerHandle, TracingLogger};
use crate::transport::HostHandle;

use super::client::ClientManager;
use super::hub::HubManager;

// ============================================================================
// HubBuilder
// ============================================================================

/// Builder for a [`HubManager`].
///
/// Use [`HubManager::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct HubBuilder {
    /// Host that announces incoming ports.
    host: Option<HostHandle>,
    /// Diagnostics sink; defaults to [`TracingLogger`].
    logger: Option<LoggerHandle>,
}

impl HubBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: HostHandle) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the logger.
    #[inline]
    #[must_use]
    pub fn logger(mut self, logger: LoggerHandle) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the hub and registers its connect handler.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no host was set
    pub fn build(self) -> Result<HubManager> {
        let host = self.host.ok_or_else(|| {
            Error::config(
                "Host is required. Use .host() to set it.\n\
                 Example: HubManager::builder().host(host)",
            )
        })?;
        let logger = self.logger.unwrap_or_else(TracingLogger::handle);

        Ok(HubManager::new(host, logger))
    }
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for a [`ClientManager`].
///
/// Use [`ClientManager::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    /// Role encoded in the port name.
    role: Role,
    /// Host used to open the port.
    host: Option<HostHandle>,
    /// Diagnostics sink; defaults to [`TracingLogger`].
    logger: Option<LoggerHandle>,
}

impl ClientBuilder {
    /// Creates a builder for the given role.
    #[inline]
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            host: None,
            logger: None,
        }
    }

    /// Sets the host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: HostHandle) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the logger.
    #[inline]
    #[must_use]
    pub fn logger(mut self, logger: LoggerHandle) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds an unconnected client.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no host was set
    pub fn build(self) -> Result<ClientManager> {
        let host = self.host.ok_or_else(|| {
            Error::config(
                "Host is required. Use .host() to set it.\n\
                 Example: ClientManager::builder(Role::Popup).host(host)",
            )
        })?;
        let logger = self.logger.unwrap_or_else(TracingLogger::handle);

        Ok(ClientManager::new(self.role, host, logger))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::logger::NoopLogger;
    use crate::messaging::ConnectionState;
    use crate::transport::MemoryHost;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = HubBuilder::new();
        assert!(builder.host.is_none());
        assert!(builder.logger.is_none());
    }

    #[test]
    fn test_hub_build_fails_without_host() {
        let err = HubBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("Host"));
    }

    #[test]
    fn test_client_build_fails_without_host() {
        let err = ClientBuilder::new(Role::Panel).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_hub_build_registers_handler() {
        let host = Arc::new(MemoryHost::new());
        let hub = HubManager::builder()
            .host(host.clone())
            .logger(Arc::new(NoopLogger))
            .build()
            .unwrap();

        host.open("popup:1");
        assert_eq!(hub.connection_count(), 1);
    }

    #[test]
    fn test_client_build_defaults() {
        let host = Arc::new(MemoryHost::new());
        let client = ClientManager::builder(Role::Settings)
            .host(host)
            .build()
            .unwrap();

        assert_eq!(client.role(), Role::Settings);
        assert_eq!(client.state(), ConnectionState::Unconnected);
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = ClientBuilder::new(Role::Popup).logger(Arc::new(NoopLogger));
        let cloned = builder.clone();
        assert_eq!(builder.role, cloned.role);
        assert!(cloned.logger.is_some());
    }
}
