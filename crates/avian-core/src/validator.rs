// ============================================
// File: crates/avian-core/src/validator.rs
// ============================================
//! # Encoded Text Validation
//!
//! ## Creation Reason
//! Some carriers rewrite parts of a post (auto-linking, truncation) and
//! the rewritten post no longer decodes to the original packet. Frames
//! whose encoding is at risk are dropped before publishing.
//!
//! ## Main Functionality
//! - `Validator`: Pluggable check run on every encoded payload
//! - `RoundTripValidator`: Re-decode + reserved character check
//!
//! ## Round-Trip Rule
//! 1. Decode the encoded text with the same codec; any error rejects it
//! 2. Reject the text if it contains the carrier's reserved reference
//!    character ('/' by default, used by the carrier to build links)
//!
//! ## ⚠️ Important Note for Next Developer
//! - A rejection drops the frame; it is never retried
//! - A stricter, grammar-based validator can replace this one through
//!   `TextCodec::with_validator` without touching the pipelines
//!
//! ## Last Modified
//! v0.1.0 - Initial validator

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// The carrier's reserved reference character.
pub const DEFAULT_RESERVED_CHAR: char = '/';

// ============================================
// Validator Trait
// ============================================

/// Check applied to every encoded payload before it is published.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the encoded payload text (without separator or label).
    ///
    /// # Errors
    /// Returns a validation error if the carrier would mangle the text.
    fn validate(&self, encoded: &str) -> Result<()>;
}

// ============================================
// RoundTripValidator
// ============================================

/// Rejects encodings that fail to re-decode or contain the reserved
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTripValidator {
    reserved: char,
}

impl RoundTripValidator {
    /// Creates a validator for the given reserved character.
    #[must_use]
    pub const fn new(reserved: char) -> Self {
        Self { reserved }
    }

    /// Returns the reserved character.
    #[must_use]
    pub const fn reserved(&self) -> char {
        self.reserved
    }
}

impl Default for RoundTripValidator {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_CHAR)
    }
}

impl Validator for RoundTripValidator {
    fn validate(&self, encoded: &str) -> Result<()> {
        BASE64
            .decode(encoded)
            .map_err(|e| CoreError::round_trip(e.to_string()))?;

        if let Some(position) = encoded.find(self.reserved) {
            return Err(CoreError::ReservedCharacter {
                ch: self.reserved,
                position,
            });
        }

        Ok(())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_clean_encoding() {
        let validator = RoundTripValidator::default();
        assert!(validator.validate("aGVsbG8gd29ybGQ=").is_ok());
    }

    #[test]
    fn test_rejects_reserved_char() {
        let validator = RoundTripValidator::default();
        // 0xff 0xff 0xff encodes to "////"
        let err = validator.validate("////").unwrap_err();
        assert_eq!(err, CoreError::ReservedCharacter { ch: '/', position: 0 });
    }

    #[test]
    fn test_rejects_undecodable() {
        let validator = RoundTripValidator::default();
        let err = validator.validate("abc").unwrap_err();
        assert!(matches!(err, CoreError::RoundTrip { .. }));
        assert!(err.is_validation_failure());
    }

    #[test]
    fn test_custom_reserved_char() {
        let validator = RoundTripValidator::new('+');
        assert_eq!(validator.reserved(), '+');
        assert!(validator.validate("////").is_ok());
        assert!(validator.validate("++++").is_err());
    }
}
