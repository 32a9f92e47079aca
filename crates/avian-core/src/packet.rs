// ============================================
// File: crates/avian-core/src/packet.rs
// ============================================
//! # Raw IP Packet
//!
//! ## Creation Reason
//! Bytes decoded from a carrier post are re-injected as a raw IP packet;
//! the raw socket needs a destination address, which is read straight
//! out of the IPv4 header.
//!
//! ## IPv4 Header Fields Used
//! ```text
//!  0      4      8             16                             31
//! ┌──────┬──────┬──────────────┬──────────────────────────────┐
//! │ ver  │ ihl  │   tos        │        total length          │
//! ├──────┴──────┴──────────────┼──────────────────────────────┤
//! │        identification      │  flags / fragment offset     │
//! ├─────────────┬──────────────┼──────────────────────────────┤
//! │    ttl      │  protocol    │        checksum              │
//! ├─────────────┴──────────────┴──────────────────────────────┤
//! │                     source address (12..16)               │
//! ├───────────────────────────────────────────────────────────┤
//! │                  destination address (16..20)             │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Version, length, protocol and checksum are NOT verified; any
//!   header-shaped prefix is accepted
//! - The TTL is NOT decremented before re-injection and nothing prevents
//!   a packet from looping between two tunnel ends
//!
//! ## Last Modified
//! v0.1.0 - Initial packet view

use std::net::Ipv4Addr;

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Minimum IPv4 header size.
pub const IPV4_HEADER_MIN_SIZE: usize = 20;

/// Offset of the TTL field.
const IPV4_TTL_OFFSET: usize = 8;

/// Offset of the protocol field.
const IPV4_PROTOCOL_OFFSET: usize = 9;

/// Offset of source IP in IPv4 header.
const IPV4_SRC_OFFSET: usize = 12;

/// Offset of destination IP in IPv4 header.
const IPV4_DST_OFFSET: usize = 16;

// ============================================
// Ipv4HeaderView
// ============================================

/// The handful of IPv4 header fields the decoder looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4HeaderView {
    /// Version nibble as found (not checked).
    pub version: u8,
    /// Time to live as found (not decremented).
    pub ttl: u8,
    /// IP protocol number.
    pub protocol: u8,
    /// Source address.
    pub source: Ipv4Addr,
    /// Destination address.
    pub destination: Ipv4Addr,
}

impl Ipv4HeaderView {
    /// Reads the header fields from the first 20 bytes of `bytes`.
    ///
    /// # Errors
    /// Returns `HeaderTooShort` if fewer than 20 bytes are available.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < IPV4_HEADER_MIN_SIZE {
            return Err(CoreError::HeaderTooShort {
                expected: IPV4_HEADER_MIN_SIZE,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            version: bytes[0] >> 4,
            ttl: bytes[IPV4_TTL_OFFSET],
            protocol: bytes[IPV4_PROTOCOL_OFFSET],
            source: read_addr(bytes, IPV4_SRC_OFFSET),
            destination: read_addr(bytes, IPV4_DST_OFFSET),
        })
    }
}

fn read_addr(bytes: &[u8], offset: usize) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    octets.copy_from_slice(&bytes[offset..offset + 4]);
    Ipv4Addr::from(octets)
}

// ============================================
// RawIpPacket
// ============================================

/// Decoded packet bytes plus their header view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIpPacket {
    bytes: Vec<u8>,
    header: Ipv4HeaderView,
}

impl RawIpPacket {
    /// Wraps decoded bytes, reading the header view.
    ///
    /// # Errors
    /// Returns `HeaderTooShort` if the bytes cannot hold an IPv4 header.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let header = Ipv4HeaderView::parse(&bytes)?;
        Ok(Self { bytes, header })
    }

    /// Returns the destination address from the header.
    #[must_use]
    pub const fn destination(&self) -> Ipv4Addr {
        self.header.destination
    }

    /// Returns the header view.
    #[must_use]
    pub const fn header(&self) -> &Ipv4HeaderView {
        &self.header
    }

    /// Returns the packet bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the packet length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the packet is empty (never, once constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the packet, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_ipv4_packet(src: Ipv4Addr, dst: Ipv4Addr, len: usize) -> Vec<u8> {
        let mut packet = vec![0u8; len];
        packet[0] = 0x45; // Version 4, IHL 5
        packet[IPV4_TTL_OFFSET] = 64;
        packet[IPV4_PROTOCOL_OFFSET] = 1; // ICMP
        packet[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].copy_from_slice(&src.octets());
        packet[IPV4_DST_OFFSET..IPV4_DST_OFFSET + 4].copy_from_slice(&dst.octets());
        packet
    }

    #[test]
    fn test_header_view() {
        let src = Ipv4Addr::new(192, 168, 56, 101);
        let dst = Ipv4Addr::new(10, 0, 0, 7);
        let bytes = create_test_ipv4_packet(src, dst, 84);

        let header = Ipv4HeaderView::parse(&bytes).unwrap();
        assert_eq!(header.version, 4);
        assert_eq!(header.ttl, 64);
        assert_eq!(header.protocol, 1);
        assert_eq!(header.source, src);
        assert_eq!(header.destination, dst);
    }

    #[test]
    fn test_raw_packet_destination() {
        let dst = Ipv4Addr::new(8, 8, 8, 8);
        let bytes = create_test_ipv4_packet(Ipv4Addr::LOCALHOST, dst, 60);

        let packet = RawIpPacket::new(bytes.clone()).unwrap();
        assert_eq!(packet.destination(), dst);
        assert_eq!(packet.len(), 60);
        assert_eq!(packet.as_bytes(), bytes.as_slice());
        assert_eq!(packet.into_bytes(), bytes);
    }

    #[test]
    fn test_header_not_validated() {
        // IPv6 version nibble and garbage checksum are accepted as-is
        let mut bytes = create_test_ipv4_packet(Ipv4Addr::LOCALHOST, Ipv4Addr::BROADCAST, 64);
        bytes[0] = 0x60;
        bytes[10] = 0xde;
        bytes[11] = 0xad;

        let packet = RawIpPacket::new(bytes).unwrap();
        assert_eq!(packet.header().version, 6);
        assert_eq!(packet.destination(), Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_short_header() {
        let err = Ipv4HeaderView::parse(&[0x45, 0x00]).unwrap_err();
        assert_eq!(err, CoreError::HeaderTooShort { expected: 20, actual: 2 });
        assert!(RawIpPacket::new(vec![0u8; 19]).is_err());
    }
}
