// ============================================
// File: crates/avian-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for frame parsing, text encoding and decoding,
//! and validation in the avian core crate.
//!
//! ## Error Categories
//! 1. **Framing Errors**: Truncated Ethernet frames or IPv4 headers
//! 2. **Validation Errors**: Encodings the carrier would mangle
//! 3. **Decode Errors**: Posts that are not tunnel traffic
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every variant here describes a defective ITEM, not a broken channel;
//!   callers drop the item and move on
//! - Keep messages short, they are logged once per dropped item
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use avian_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for framing and codec operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ========================================
    // Framing Errors
    // ========================================

    /// Ethernet frame is shorter than its header.
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Buffer is too short to hold an IPv4 header.
    #[error("Header too short: expected at least {expected} bytes, got {actual}")]
    HeaderTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    // ========================================
    // Validation Errors
    // ========================================

    /// Encoded text contains the carrier's reserved reference character.
    #[error("Encoded text contains reserved character '{ch}' at offset {position}")]
    ReservedCharacter {
        /// The reserved character found
        ch: char,
        /// Byte offset of the first occurrence
        position: usize,
    },

    /// Encoded text did not survive re-decoding.
    #[error("Encoded text failed round-trip: {reason}")]
    RoundTrip {
        /// Why re-decoding failed
        reason: String,
    },

    /// Message would not fit in one carrier post.
    #[error("Message too long: max {max} characters, got {actual}")]
    PostTooLong {
        /// Carrier post limit
        max: usize,
        /// Actual message length
        actual: usize,
    },

    // ========================================
    // Decode Errors
    // ========================================

    /// Post carries no payload token.
    #[error("Post has no payload token")]
    EmptyToken,

    /// Payload token is not valid base64.
    #[error("Invalid payload encoding: {reason}")]
    InvalidEncoding {
        /// Decoder error details
        reason: String,
    },

    /// Decoded payload is shorter than a plausible packet.
    #[error("Decoded packet too short: expected at least {min} bytes, got {actual}")]
    PacketTooShort {
        /// Configured floor
        min: usize,
        /// Actual decoded length
        actual: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates a `RoundTrip` error.
    pub fn round_trip(reason: impl Into<String>) -> Self {
        Self::RoundTrip {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidEncoding` error.
    pub fn invalid_encoding(reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the encoder rejected its own output.
    #[must_use]
    pub const fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::ReservedCharacter { .. } | Self::RoundTrip { .. } | Self::PostTooLong { .. }
        )
    }

    /// Returns `true` if a received post is not tunnel traffic.
    #[must_use]
    pub const fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::EmptyToken | Self::InvalidEncoding { .. } | Self::PacketTooShort { .. }
        )
    }

    /// Returns `true` if a captured frame could not be unwrapped.
    #[must_use]
    pub const fn is_framing_failure(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. } | Self::HeaderTooShort { .. }
        )
    }
}

// ============================================
// Tests
// ============================================
