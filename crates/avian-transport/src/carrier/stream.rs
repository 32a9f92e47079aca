// ============================================
// File: crates/avian-transport/src/carrier/stream.rs
// ============================================
//! # Filtered Stream Framing
//!
//! ## Creation Reason
//! The filtered stream is newline-delimited JSON delivered in arbitrary
//! chunks. Lines must be reassembled before they can be classified.
//!
//! ## Main Functionality
//! - `LineBuffer`: Accumulates chunks, yields complete lines
//! - `parse_stream_line`: Turns one line into a `StreamItem`
//!
//! ## Line Classification
//! | Line | Item |
//! |------|------|
//! | empty (keep-alive) | `Other("keep-alive")` |
//! | `{"data": {"id", "text"}}` | `Post` |
//! | anything else | `Other(line)` |
//!
//! ## Last Modified
//! v0.1.0 - Initial stream framing

use bytes::{Buf, BytesMut};

use avian_core::CarrierPost;

use crate::carrier::models::StreamEnvelope;
use crate::traits::StreamItem;

/// Description used for keep-alive lines.
pub const KEEP_ALIVE: &str = "keep-alive";

/// Longest partial line kept while waiting for its newline.
const MAX_LINE_LEN: usize = 64 * 1024;

// ============================================
// LineBuffer
// ============================================

/// Reassembles newline-terminated lines from stream chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk received from the stream.
    ///
    /// A partial line that grows past 64 KiB is discarded.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > MAX_LINE_LEN && !self.buf.contains(&b'\n') {
            self.buf.clear();
        }
    }

    /// Takes the next complete line, without its `\n` or `\r\n`.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line = self.buf.split_to(pos);
        self.buf.advance(1);

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Returns the number of buffered bytes not yet returned as lines.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

// ============================================
// Classification
// ============================================

/// Classifies one stream line.
#[must_use]
pub fn parse_stream_line(line: &str) -> StreamItem {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StreamItem::Other(KEEP_ALIVE.to_string());
    }

    match serde_json::from_str::<StreamEnvelope>(trimmed) {
        Ok(StreamEnvelope {
            data: Some(post), ..
        }) => StreamItem::Post(CarrierPost::with_id(post.id, post.text)),
        _ => StreamItem::Other(trimmed.to_string()),
    }
}

// ============================================
// Tests
// ============================================
