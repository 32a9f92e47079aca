// ============================================
// File: crates/avian-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for the three I/O primitives the tunnel consumes:
//! the link-layer listener, the raw IP send socket and the carrier.
//!
//! ## Main Functionality
//! - `TransportError`: Listener and raw socket errors
//! - `CarrierError`: Publish/subscribe errors, with rate limiting split out
//! - Categorization of retryable vs startup errors
//!
//! ## Error Categories
//! 1. **Startup Errors**: Interface missing, bind failure, no privileges
//! 2. **Runtime Errors**: Read/send failures, transient by nature
//! 3. **Carrier Errors**: HTTP failures, rejections, rate limits
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never put bearer tokens into error text; carrier error bodies are
//!   truncated before they are stored
//! - Rate limiting is its own variant because it gets a longer pause
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use thiserror::Error;

// ============================================
// Result Type Aliases
// ============================================

/// Result type for listener and raw socket operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Result type for carrier operations.
pub type CarrierResult<T> = std::result::Result<T, CarrierError>;

/// Longest carrier error body kept in an error value.
const MAX_ERROR_BODY: usize = 256;

// ============================================
// TransportError
// ============================================

/// Link-layer and raw socket error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Startup Errors
    // ========================================

    /// Network interface does not exist.
    #[error("Interface '{name}' not found")]
    InterfaceNotFound {
        /// Requested interface name
        name: String,
    },

    /// Failed to open or bind the link-layer listener.
    #[error("Failed to listen on '{interface}': {reason}")]
    ListenFailed {
        /// Interface name
        interface: String,
        /// Why listening failed
        reason: String,
    },

    /// Failed to open the raw send socket.
    #[error("Failed to open raw socket: {reason}")]
    SocketFailed {
        /// Why the socket could not be opened
        reason: String,
    },

    /// Permission denied for operation.
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// What operation was denied
        operation: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig {
        /// Configuration field name
        field: String,
        /// Why it's invalid
        reason: String,
    },

    // ========================================
    // Runtime Errors
    // ========================================

    /// Frame read failed.
    #[error("Frame read failed: {reason}")]
    ReadFailed {
        /// Why read failed
        reason: String,
    },

    /// Raw send failed.
    #[error("Failed to send to {dest}: {reason}")]
    SendFailed {
        /// Destination address
        dest: Ipv4Addr,
        /// Why send failed
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Creates a `ListenFailed` error.
    pub fn listen_failed(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ListenFailed {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ReadFailed` error.
    pub fn read_failed(reason: impl Into<String>) -> Self {
        Self::ReadFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `SendFailed` error.
    pub fn send_failed(dest: Ipv4Addr, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            dest,
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an `InvalidConfig` error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error is transient and the loop should retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReadFailed { .. } | Self::SendFailed { .. } => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error means the primitive could not be opened.
    #[must_use]
    pub const fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound { .. }
                | Self::ListenFailed { .. }
                | Self::SocketFailed { .. }
                | Self::PermissionDenied { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Returns `true` if this error requires elevated privileges.
    #[must_use]
    pub const fn requires_privileges(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

// ============================================
// CarrierError
// ============================================

/// Carrier client error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarrierError {
    /// Carrier refused the request because of its rate limit.
    #[error("Rate limited by carrier{}", retry_hint(*.retry_after))]
    RateLimited {
        /// How long the carrier asked us to wait, if it said
        retry_after: Option<Duration>,
    },

    /// Carrier answered with a non-success status.
    #[error("Carrier rejected request with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Request could not be completed (connect, timeout, TLS).
    #[error("Carrier request failed: {reason}")]
    Request {
        /// Why the request failed
        reason: String,
    },

    /// Carrier response could not be understood.
    #[error("Unexpected carrier response: {reason}")]
    Decode {
        /// What was wrong with the response
        reason: String,
    },

    /// Credential required for this operation is not configured.
    #[error("Missing carrier credential: {name}")]
    MissingCredential {
        /// Configuration key of the credential
        name: &'static str,
    },
}

fn retry_hint(retry_after: Option<Duration>) -> String {
    retry_after.map_or_else(String::new, |d| format!(" (retry after {}s)", d.as_secs()))
}

impl CarrierError {
    /// Creates a `Rejected` error, truncating the body.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::Rejected { status, body }
    }

    /// Creates a `Request` error.
    pub fn request(reason: impl Into<String>) -> Self {
        Self::Request {
            reason: reason.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Returns `true` for rate-limit rejections.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Request { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Decode { .. } | Self::MissingCredential { .. } => false,
        }
    }
}

impl From<reqwest::Error> for CarrierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::request(err.to_string())
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::listen_failed("enp0s8", "no such device");
        assert!(err.to_string().contains("enp0s8"));
        assert!(err.to_string().contains("no such device"));

        let err = TransportError::send_failed(Ipv4Addr::new(10, 0, 0, 1), "unreachable");
        assert!(err.to_string().contains("10.0.0.1"));
    }

    #[test]
    fn test_error_classification() {
        let read_err = TransportError::read_failed("network is down");
        assert!(read_err.is_retryable());
        assert!(!read_err.is_startup_error());

        let missing = TransportError::InterfaceNotFound { name: "eth9".into() };
        assert!(missing.is_startup_error());
        assert!(!missing.is_retryable());

        let denied = TransportError::PermissionDenied {
            operation: "open AF_PACKET socket".into(),
        };
        assert!(denied.requires_privileges());
    }

    #[test]
    fn test_io_error_classification() {
        let interrupted = TransportError::io(
            "setting non-blocking",
            io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
        );
        assert!(interrupted.is_retryable());

        let denied = TransportError::io(
            "setting non-blocking",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!denied.is_retryable());
        assert!(!denied.is_startup_error());
    }

    #[test]
    fn test_carrier_error_classification() {
        let limited = CarrierError::RateLimited {
            retry_after: Some(Duration::from_secs(15)),
        };
        assert!(limited.is_rate_limited());
        assert!(limited.is_retryable());
        assert!(limited.to_string().contains("retry after 15s"));

        let forbidden = CarrierError::rejected(403, "duplicate content");
        assert!(!forbidden.is_rate_limited());
        assert!(!forbidden.is_retryable());

        assert!(CarrierError::rejected(503, "").is_retryable());
        assert!(!CarrierError::MissingCredential { name: "user_token" }.is_retryable());
    }

    #[test]
    fn test_rejected_body_truncated() {
        let err = CarrierError::rejected(400, "x".repeat(1000));
        match err {
            CarrierError::Rejected { body, .. } => assert_eq!(body.len(), MAX_ERROR_BODY),
            other => panic!("unexpected: {other}"),
        }
    }
}
