// ============================================
// File: crates/avian-tunnel/src/error.rs
// ============================================
//! # Tunnel Error Types
//!
//! Errors that stop the tunnel from starting. Once both pipelines run,
//! failures are logged and turned into step outcomes instead.
//!
//! ## Last Modified
//! v0.1.0 - Initial tunnel errors

use thiserror::Error;

use avian_transport::error::{CarrierError, TransportError};

/// Result type for tunnel operations.
pub type Result<T> = std::result::Result<T, TunnelError>;

/// Tunnel error types.
#[derive(Error, Debug)]
pub enum TunnelError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Path of the file
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending field
        field: String,
        /// Why it's invalid
        reason: String,
    },

    /// Required configuration value absent.
    #[error("Missing required configuration: {field}")]
    ConfigMissing {
        /// Missing field
        field: String,
    },

    /// A primitive could not be opened.
    #[error("Tunnel failed to start: {reason}")]
    StartupFailed {
        /// Why startup failed
        reason: String,
    },

    #[allow(missing_docs)]
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[allow(missing_docs)]
    #[error(transparent)]
    Carrier(#[from] CarrierError),
}

impl TunnelError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigMissing` error.
    pub fn config_missing(field: impl Into<String>) -> Self {
        Self::ConfigMissing {
            field: field.into(),
        }
    }

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Returns `true` for configuration problems.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::ConfigMissing { .. }
        )
    }

    /// Returns `true` if retrying cannot help and the tunnel must not
    /// start. Retryable carrier errors are left to the decoder.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_startup_error(),
            Self::Carrier(e) => !e.is_retryable(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TunnelError::config_load("/etc/avian/tunnel.toml", "file not found");
        assert!(err.to_string().contains("/etc/avian/tunnel.toml"));

        let err = TunnelError::config_missing("carrier.user_token");
        assert!(err.to_string().contains("carrier.user_token"));
    }

    #[test]
    fn test_error_classification() {
        let config_err = TunnelError::config_invalid("pacing.read_retry_ms", "must be > 0");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let startup = TunnelError::from(TransportError::InterfaceNotFound {
            name: "enp0s8".into(),
        });
        assert!(startup.is_fatal());

        let transient = TunnelError::from(TransportError::read_failed("link down"));
        assert!(!transient.is_fatal());

        let limited = TunnelError::from(CarrierError::RateLimited { retry_after: None });
        assert!(!limited.is_fatal());

        let unreachable = TunnelError::from(CarrierError::request("connection refused"));
        assert!(!unreachable.is_fatal());

        let unauthorized = TunnelError::from(CarrierError::rejected(401, "Unauthorized"));
        assert!(unauthorized.is_fatal());
        assert!(!unauthorized.is_config_error());
    }
}
