// ============================================
// File: crates/avian-core/src/message.rs
// ============================================
//! # Carrier Message Types
//!
//! ## Creation Reason
//! Names the two shapes a payload takes on the carrier: the message we
//! publish and the post we receive back.
//!
//! ## Main Functionality
//! - `EncodedMessage`: `<encoded payload> <routing label>`, ready to publish
//! - `CarrierPost`: Post text as delivered by the carrier
//!
//! ## ⚠️ Important Note for Next Developer
//! - Only the text before the first whitespace matters on receive; the
//!   label and anything the carrier appends are ignored
//!
//! ## Last Modified
//! v0.1.0 - Initial message types

use std::fmt;

use avian_common::RoutingLabel;

use crate::codec::SEPARATOR;

// ============================================
// EncodedMessage
// ============================================

/// A validated, label-tagged payload ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    text: String,
    encoded_len: usize,
}

impl EncodedMessage {
    /// Joins an already validated encoding and a routing label.
    pub(crate) fn new(encoded: &str, label: &RoutingLabel) -> Self {
        let mut text = String::with_capacity(encoded.len() + 1 + label.len());
        text.push_str(encoded);
        text.push(SEPARATOR);
        text.push_str(label.as_str());

        Self {
            text,
            encoded_len: encoded.len(),
        }
    }

    /// Returns the full text to publish.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns only the encoded payload portion.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.text[..self.encoded_len]
    }

    /// Returns the routing label portion.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.text[self.encoded_len + SEPARATOR.len_utf8()..]
    }

    /// Returns the message length in characters, as the carrier counts it.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Consumes the message, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for EncodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================
// CarrierPost
// ============================================

/// A post received from the carrier's filtered stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierPost {
    /// Carrier-assigned post id, if the carrier reports one.
    pub id: Option<String>,
    /// Full post text.
    pub text: String,
}

impl CarrierPost {
    /// Creates a post from its text alone.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    /// Creates a post with a carrier id.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }

    /// Returns the payload token: everything before the first whitespace.
    #[must_use]
    pub fn token(&self) -> &str {
        first_token(&self.text)
    }
}

/// Returns the text up to (not including) the first whitespace character.
#[must_use]
pub fn first_token(text: &str) -> &str {
    text.split(char::is_whitespace).next().unwrap_or_default()
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_message_parts() {
        let label = RoutingLabel::new("#out").unwrap();
        let msg = EncodedMessage::new("QUJD", &label);

        assert_eq!(msg.text(), "QUJD #out");
        assert_eq!(msg.encoded(), "QUJD");
        assert_eq!(msg.label(), "#out");
        assert_eq!(msg.char_len(), 9);
        assert_eq!(msg.to_string(), "QUJD #out");
    }

    #[test]
    fn test_post_token() {
        let post = CarrierPost::new("QUJD #label https://carrier.example/p/1");
        assert_eq!(post.token(), "QUJD");

        let post = CarrierPost::with_id("1", "QUJD\n#label");
        assert_eq!(post.token(), "QUJD");
        assert_eq!(post.id.as_deref(), Some("1"));
    }

    #[test]
    fn test_post_token_edge_cases() {
        assert_eq!(first_token(""), "");
        assert_eq!(first_token(" leading"), "");
        assert_eq!(first_token("solo"), "solo");
    }
}
