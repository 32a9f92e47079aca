// ============================================
// File: crates/avian-core/src/codec.rs
// ============================================
//! # Text Codec
//!
//! ## Creation Reason
//! The carrier only transports printable text. Packets are turned into
//! base64, checked, tagged with a routing label on the way out, and
//! turned back into bytes on the way in.
//!
//! ## Main Functionality
//! - `encode` / `decode`: Plain base64 (standard alphabet, padded)
//! - `TextCodec`: Validator + post budget + minimum packet floor
//!
//! ## Main Logical Flow
//! ```text
//! Outbound: payload ─► base64 ─► validate ─► "<b64> <label>"
//! Inbound:  "<b64> <label> ..." ─► first token ─► base64⁻¹ ─► len ≥ floor
//! ```
//!
//! ## Post Budget
//! A post holds at most `max_post_len` characters. The largest payload
//! that fits next to the separator and label is
//! `((max_post_len - label_len - 1) / 4) * 3` bytes.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Results shorter than `min_packet_len` are noise (other users posting
//!   under the same label), not packets to retry
//! - `decode_post` must stay pure: same text in, same bytes out
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use avian_common::RoutingLabel;

use crate::error::{CoreError, Result};
use crate::message::{first_token, EncodedMessage};
use crate::packet::RawIpPacket;
use crate::validator::{RoundTripValidator, Validator};

// ============================================
// Constants
// ============================================

/// Separator between the encoded payload and the routing label.
pub const SEPARATOR: char = ' ';

/// Shortest decoded payload accepted as a packet.
pub const DEFAULT_MIN_PACKET_LEN: usize = 60;

/// Longest post the carrier accepts, in characters.
pub const DEFAULT_MAX_POST_LEN: usize = 280;

// ============================================
// Plain Codec
// ============================================

/// Encodes bytes as standard, padded base64.
#[must_use]
pub fn encode(payload: &[u8]) -> String {
    BASE64.encode(payload)
}

/// Decodes standard, padded base64.
///
/// # Errors
/// Returns `InvalidEncoding` if the text is not valid base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text)
        .map_err(|e| CoreError::invalid_encoding(e.to_string()))
}

// ============================================
// TextCodec
// ============================================

/// Encodes payloads into carrier messages and decodes posts into packets.
///
/// # Example
/// ```
/// use avian_common::RoutingLabel;
/// use avian_core::TextCodec;
///
/// let codec = TextCodec::new();
/// let label = RoutingLabel::new("#out").unwrap();
///
/// let msg = codec.encode_message(&[0x41; 64], &label).unwrap();
/// let packet = codec.decode_post(msg.text()).unwrap();
/// assert_eq!(packet.as_bytes(), &[0x41; 64]);
/// ```
#[derive(Debug)]
pub struct TextCodec {
    validator: Box<dyn Validator>,
    min_packet_len: usize,
    max_post_len: usize,
}

impl TextCodec {
    /// Creates a codec with the round-trip validator and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: Box::new(RoundTripValidator::default()),
            min_packet_len: DEFAULT_MIN_PACKET_LEN,
            max_post_len: DEFAULT_MAX_POST_LEN,
        }
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the minimum plausible packet length.
    #[must_use]
    pub const fn with_min_packet_len(mut self, min_packet_len: usize) -> Self {
        self.min_packet_len = min_packet_len;
        self
    }

    /// Sets the carrier's post length limit.
    #[must_use]
    pub const fn with_max_post_len(mut self, max_post_len: usize) -> Self {
        self.max_post_len = max_post_len;
        self
    }

    /// Returns the minimum plausible packet length.
    #[must_use]
    pub const fn min_packet_len(&self) -> usize {
        self.min_packet_len
    }

    /// Returns the carrier's post length limit.
    #[must_use]
    pub const fn max_post_len(&self) -> usize {
        self.max_post_len
    }

    /// Returns the largest payload, in bytes, whose message fits one post
    /// when tagged with `label`. Zero if the label leaves no room.
    #[must_use]
    pub fn payload_capacity(&self, label: &RoutingLabel) -> usize {
        let room = self
            .max_post_len
            .saturating_sub(label.char_len())
            .saturating_sub(SEPARATOR.len_utf8());
        (room / 4) * 3
    }

    /// Encodes and validates a payload, then tags it with `label`.
    ///
    /// # Errors
    /// - `RoundTrip` / `ReservedCharacter` from the validator
    /// - `PostTooLong` if the message exceeds the post limit
    pub fn encode_message(&self, payload: &[u8], label: &RoutingLabel) -> Result<EncodedMessage> {
        let encoded = encode(payload);
        self.validator.validate(&encoded)?;

        let message = EncodedMessage::new(&encoded, label);
        let len = message.char_len();
        if len > self.max_post_len {
            return Err(CoreError::PostTooLong {
                max: self.max_post_len,
                actual: len,
            });
        }

        Ok(message)
    }

    /// Decodes the first token of a post into payload bytes.
    ///
    /// # Errors
    /// - `EmptyToken` if the text starts with whitespace or is empty
    /// - `InvalidEncoding` if the token is not base64
    /// - `PacketTooShort` if fewer than `min_packet_len` bytes result
    pub fn decode_token(&self, text: &str) -> Result<Vec<u8>> {
        let token = first_token(text);
        if token.is_empty() {
            return Err(CoreError::EmptyToken);
        }

        let bytes = decode(token)?;
        if bytes.len() < self.min_packet_len {
            return Err(CoreError::PacketTooShort {
                min: self.min_packet_len,
                actual: bytes.len(),
            });
        }

        Ok(bytes)
    }

    /// Decodes a post into a raw IP packet.
    ///
    /// # Errors
    /// Any error from [`decode_token`](Self::decode_token), or
    /// `HeaderTooShort` if the floor is configured below 20 bytes.
    pub fn decode_post(&self, text: &str) -> Result<RawIpPacket> {
        RawIpPacket::new(self.decode_token(text)?)
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Tests
// ============================================
