// ============================================
// File: crates/avian-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the value types that cross crate boundaries: the link-layer
//! address reported by the frame listener and the routing label that tags
//! one tunnel direction on the carrier.
//!
//! ## Main Functionality
//! - `MacAddr`: 48-bit Ethernet hardware address
//! - `RoutingLabel`: Opaque, non-empty carrier filter keyword
//!
//! ## ⚠️ Important Note for Next Developer
//! - Routing labels are compared byte-for-byte by the carrier's filter;
//!   never normalize case or strip the leading '#'
//! - The two configured labels are intentionally NOT validated against
//!   each other (both directions may share one label)
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

// ============================================
// Constants
// ============================================

/// Size of a MAC address in bytes.
pub const MAC_ADDR_SIZE: usize = 6;

// ============================================
// MacAddr
// ============================================

/// Ethernet hardware address.
///
/// # Example
/// ```
/// use avian_common::types::MacAddr;
///
/// let mac: MacAddr = "de:ad:be:ef:00:01".parse().unwrap();
/// assert_eq!(mac.to_string(), "de:ad:be:ef:00:01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MacAddr([u8; MAC_ADDR_SIZE]);

impl MacAddr {
    /// The all-zero address, reported when the kernel gives no link address.
    pub const UNSPECIFIED: Self = Self([0; MAC_ADDR_SIZE]);

    /// The broadcast address `ff:ff:ff:ff:ff:ff`.
    pub const BROADCAST: Self = Self([0xff; MAC_ADDR_SIZE]);

    /// Creates a `MacAddr` from its six octets.
    #[must_use]
    pub const fn new(octets: [u8; MAC_ADDR_SIZE]) -> Self {
        Self(octets)
    }

    /// Creates a `MacAddr` from a slice of exactly six bytes.
    ///
    /// # Errors
    /// Returns `InvalidLength` if the slice is not six bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; MAC_ADDR_SIZE] = bytes
            .try_into()
            .map_err(|_| CommonError::invalid_length(MAC_ADDR_SIZE, bytes.len()))?;
        Ok(Self(octets))
    }

    /// Returns the six octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; MAC_ADDR_SIZE] {
        self.0
    }

    /// Returns `true` for the broadcast address.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let mut octets = [0u8; MAC_ADDR_SIZE];
        let mut parts = s.split(':');

        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| CommonError::invalid_input("mac", "expected 6 octets"))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| CommonError::invalid_input("mac", format!("bad octet '{part}'")))?;
        }

        if parts.next().is_some() {
            return Err(CommonError::invalid_input("mac", "expected 6 octets"));
        }

        Ok(Self(octets))
    }
}

impl From<[u8; MAC_ADDR_SIZE]> for MacAddr {
    fn from(octets: [u8; MAC_ADDR_SIZE]) -> Self {
        Self(octets)
    }
}

// ============================================
// RoutingLabel
// ============================================

/// Filter keyword distinguishing one tunnel direction on the carrier.
///
/// The outbound side appends its label to every post; the inbound side
/// subscribes to posts matching its label. The carrier does the matching,
/// so the label is otherwise opaque.
///
/// # Example
/// ```
/// use avian_common::types::RoutingLabel;
///
/// let label = RoutingLabel::new("#2_4_4_0_24").unwrap();
/// assert_eq!(label.as_str(), "#2_4_4_0_24");
/// assert!(RoutingLabel::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutingLabel(String);

impl RoutingLabel {
    /// Creates a routing label.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the label is empty.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(CommonError::invalid_input("routing_label", "cannot be empty"));
        }
        Ok(Self(label))
    }

    /// Returns the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the label length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the label length in characters, the unit the carrier's
    /// post limit is counted in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always `false`; labels are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RoutingLabel {
    fn default() -> Self {
        Self("#2_4_4_0_24".to_string())
    }
}

impl fmt::Display for RoutingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoutingLabel {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoutingLabel {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RoutingLabel> for String {
    fn from(label: RoutingLabel) -> Self {
        label.0
    }
}

impl AsRef<str> for RoutingLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================
// Tests
// ============================================
