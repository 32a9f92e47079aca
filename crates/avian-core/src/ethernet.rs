// ============================================
// File: crates/avian-core/src/ethernet.rs
// ============================================
//! # Ethernet Frame Parsing
//!
//! ## Creation Reason
//! The link-layer listener hands over whole Ethernet II frames; only the
//! payload travels over the carrier, so the header has to be peeled off.
//!
//! ## Frame Layout
//! ```text
//! ┌──────────┬──────────┬──────────────────┬───────────┬──────────────┐
//! │ dst (6)  │ src (6)  │ [tag 0x8100 (4)] │ type (2)  │ payload      │
//! │          │          │ [tag 0x88a8 (4)] │           │              │
//! └──────────┴──────────┴──────────────────┴───────────┴──────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Parsing is zero-copy: `payload` borrows the read buffer
//! - At most two VLAN tags (802.1ad outer + 802.1Q inner) are stripped
//! - No FCS is present on frames read from AF_PACKET sockets
//!
//! ## Last Modified
//! v0.1.0 - Initial frame parser

use avian_common::MacAddr;

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Ethernet II header size (no tags).
pub const ETHERNET_HEADER_SIZE: usize = 14;

/// Size of one VLAN tag (TPID + TCI).
const VLAN_TAG_SIZE: usize = 4;

/// Maximum number of stacked VLAN tags we strip.
const MAX_VLAN_TAGS: usize = 2;

/// Ether-type for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Ether-type (TPID) for an 802.1Q VLAN tag.
pub const ETHERTYPE_VLAN: u16 = 0x8100;

/// Ether-type (TPID) for an 802.1ad service VLAN tag.
pub const ETHERTYPE_SERVICE_VLAN: u16 = 0x88a8;

// ============================================
// EthernetFrame
// ============================================

/// A parsed Ethernet II frame borrowing its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    /// Destination hardware address.
    pub destination: MacAddr,
    /// Source hardware address.
    pub source: MacAddr,
    /// VLAN tag control fields, outermost first.
    pub vlan_tags: Vec<u16>,
    /// Ether-type of the payload.
    pub ether_type: u16,
    /// Frame payload (the IP packet for ether-type 0x0800).
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Parses a raw frame.
    ///
    /// # Errors
    /// Returns `FrameTooShort` if the buffer ends inside the header or a
    /// VLAN tag.
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < ETHERNET_HEADER_SIZE {
            return Err(CoreError::FrameTooShort {
                expected: ETHERNET_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let destination = MacAddr::from_slice(&buf[0..6])?;
        let source = MacAddr::from_slice(&buf[6..12])?;

        let mut offset = 12;
        let mut ether_type = read_u16(buf, offset);
        offset += 2;

        let mut vlan_tags = Vec::new();
        while is_vlan_tpid(ether_type) && vlan_tags.len() < MAX_VLAN_TAGS {
            let needed = offset + VLAN_TAG_SIZE;
            if buf.len() < needed {
                return Err(CoreError::FrameTooShort {
                    expected: needed,
                    actual: buf.len(),
                });
            }
            vlan_tags.push(read_u16(buf, offset));
            ether_type = read_u16(buf, offset + 2);
            offset += VLAN_TAG_SIZE;
        }

        Ok(Self {
            destination,
            source,
            vlan_tags,
            ether_type,
            payload: &buf[offset..],
        })
    }

    /// Returns the 12-bit VLAN id of the innermost tag, if tagged.
    #[must_use]
    pub fn vlan_id(&self) -> Option<u16> {
        self.vlan_tags.last().map(|tci| tci & 0x0fff)
    }

    /// Returns the header length (including tags) that preceded the payload.
    #[must_use]
    pub fn header_len(&self) -> usize {
        ETHERNET_HEADER_SIZE + self.vlan_tags.len() * VLAN_TAG_SIZE
    }
}

// ============================================
// Helper Functions
// ============================================

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

const fn is_vlan_tpid(ether_type: u16) -> bool {
    matches!(ether_type, ETHERTYPE_VLAN | ETHERTYPE_SERVICE_VLAN)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const DST: [u8; 6] = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    const SRC: [u8; 6] = [0x08, 0x00, 0x27, 0x01, 0x02, 0x03];

    fn frame(tags: &[(u16, u16)], ether_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&DST);
        buf.extend_from_slice(&SRC);
        for (tpid, tci) in tags {
            buf.extend_from_slice(&tpid.to_be_bytes());
            buf.extend_from_slice(&tci.to_be_bytes());
        }
        buf.extend_from_slice(&ether_type.to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn test_parse_untagged() {
        let raw = frame(&[], ETHERTYPE_IPV4, b"ip packet bytes");
        let parsed = EthernetFrame::parse(&raw).unwrap();

        assert!(parsed.destination.is_broadcast());
        assert_eq!(parsed.source, MacAddr::new(SRC));
        assert_eq!(parsed.ether_type, ETHERTYPE_IPV4);
        assert_eq!(parsed.payload, b"ip packet bytes");
        assert_eq!(parsed.vlan_id(), None);
        assert_eq!(parsed.header_len(), ETHERNET_HEADER_SIZE);
    }

    #[test]
    fn test_parse_vlan_tagged() {
        let raw = frame(&[(ETHERTYPE_VLAN, 0x2064)], ETHERTYPE_IPV4, b"payload");
        let parsed = EthernetFrame::parse(&raw).unwrap();

        assert_eq!(parsed.vlan_tags, vec![0x2064]);
        assert_eq!(parsed.vlan_id(), Some(0x064));
        assert_eq!(parsed.ether_type, ETHERTYPE_IPV4);
        assert_eq!(parsed.payload, b"payload");
    }

    #[test]
    fn test_parse_double_tagged() {
        let raw = frame(
            &[(ETHERTYPE_SERVICE_VLAN, 0x0010), (ETHERTYPE_VLAN, 0x0020)],
            ETHERTYPE_IPV4,
            b"qinq",
        );
        let parsed = EthernetFrame::parse(&raw).unwrap();

        assert_eq!(parsed.vlan_tags, vec![0x0010, 0x0020]);
        assert_eq!(parsed.vlan_id(), Some(0x020));
        assert_eq!(parsed.header_len(), 22);
        assert_eq!(parsed.payload, b"qinq");
    }

    #[test]
    fn test_parse_empty_payload() {
        let raw = frame(&[], ETHERTYPE_IPV4, &[]);
        let parsed = EthernetFrame::parse(&raw).unwrap();
        assert!(parsed.payload.is_empty());
    }

    #[test]
    fn test_parse_short_frame() {
        let err = EthernetFrame::parse(&[0u8; 10]).unwrap_err();
        assert_eq!(err, CoreError::FrameTooShort { expected: 14, actual: 10 });
    }

    #[test]
    fn test_parse_truncated_tag() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&DST);
        raw.extend_from_slice(&SRC);
        raw.extend_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
        raw.push(0x00);

        let err = EthernetFrame::parse(&raw).unwrap_err();
        assert!(err.is_framing_failure());
    }
}
