// ============================================
// File: crates/avian-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Foundational error type for value-type construction and parsing,
//! wrapped by the richer error enums of the other crates.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never put carrier credentials into error messages
//! - Implement `From` in downstream crates for `?` propagation
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across avian crates.
///
/// # Example
/// ```
/// use avian_common::error::{CommonError, Result};
///
/// fn require_label(label: &str) -> Result<()> {
///     if label.is_empty() {
///         return Err(CommonError::invalid_input("label", "cannot be empty"));
///     }
///     Ok(())
/// }
///
/// assert!(require_label("").is_err());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid input data provided.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the field or parameter
        field: String,
        /// Description of what's wrong
        reason: String,
    },

    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length received
        actual: usize,
    },
}

impl CommonError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidLength` error.
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
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
        let err = CommonError::invalid_input("track", "cannot be empty");
        assert_eq!(err.to_string(), "Invalid input for 'track': cannot be empty");

        let err = CommonError::invalid_length(6, 4);
        assert!(err.to_string().contains("expected 6"));
        assert!(err.to_string().contains("got 4"));
    }
}
