// ============================================
// File: crates/avian-transport/src/link/mock.rs
// ============================================
//! # Mock Frame Listener
//!
//! ## Creation Reason
//! Lets the encoder pipeline be driven in tests without a packet socket
//! or root privileges.
//!
//! ## Main Functionality
//! - Scripted reads: frames or read errors, returned in order
//! - Blocks like a real socket once the script is exhausted
//! - Records when each read was attempted (Tokio clock, so paused-time
//!   tests see virtual instants)
//!
//! ## ⚠️ Important Note for Next Developer
//! - Testing only; the script queue is bounded
//!
//! ## Last Modified
//! v0.1.0 - Initial mock listener

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use avian_common::MacAddr;

use crate::error::{Result, TransportError};
use crate::traits::FrameListener;

/// Maximum number of scripted reads.
const MAX_QUEUE_SIZE: usize = 1000;

enum ScriptedRead {
    Frame { source: MacAddr, bytes: Vec<u8> },
    Error(String),
}

/// In-memory frame listener for tests.
///
/// # Example
/// ```
/// use avian_common::MacAddr;
/// use avian_transport::link::MockListener;
/// use avian_transport::traits::FrameListener;
///
/// # #[tokio::main]
/// # async fn main() {
/// let listener = MockListener::new("mock0");
/// listener.inject_frame(MacAddr::BROADCAST, vec![1, 2, 3]);
///
/// let mut buf = [0u8; 2];
/// let (len, source) = listener.read_frame(&mut buf).await.unwrap();
/// assert_eq!(len, 2);
/// assert_eq!(source, MacAddr::BROADCAST);
/// # }
/// ```
pub struct MockListener {
    interface: String,
    script: Mutex<VecDeque<ScriptedRead>>,
    attempts: Mutex<Vec<Instant>>,
    notify: Notify,
}

impl MockListener {
    /// Creates a listener with an empty script.
    #[must_use]
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            script: Mutex::new(VecDeque::new()),
            attempts: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    /// Queues a frame for a future read.
    ///
    /// # Panics
    /// Panics if the script is full.
    pub fn inject_frame(&self, source: MacAddr, bytes: Vec<u8>) {
        self.push(ScriptedRead::Frame { source, bytes });
    }

    /// Queues a read failure.
    ///
    /// # Panics
    /// Panics if the script is full.
    pub fn inject_error(&self, reason: impl Into<String>) {
        self.push(ScriptedRead::Error(reason.into()));
    }

    fn push(&self, item: ScriptedRead) {
        let mut script = self.script.lock();
        assert!(script.len() < MAX_QUEUE_SIZE, "Mock listener script overflow");
        script.push_back(item);
        drop(script);
        self.notify.notify_one();
    }

    /// Returns how many times `read_frame` has been called.
    #[must_use]
    pub fn read_attempts(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Returns the instants at which reads were attempted.
    #[must_use]
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }

    /// Returns the number of scripted reads not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl FrameListener for MockListener {
    async fn read_frame(&self, buf: &mut [u8]) -> Result<(usize, MacAddr)> {
        self.attempts.lock().push(Instant::now());

        loop {
            let next = self.script.lock().pop_front();
            match next {
                Some(ScriptedRead::Frame { source, bytes }) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    return Ok((len, source));
                }
                Some(ScriptedRead::Error(reason)) => {
                    return Err(TransportError::read_failed(reason));
                }
                None => self.notify.notified().await,
            }
        }
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_scripted_reads_in_order() {
        let listener = MockListener::new("mock0");
        let source = MacAddr::new([0x02, 0, 0, 0, 0, 1]);
        listener.inject_error("link down");
        listener.inject_frame(source, vec![0xaa; 10]);

        let mut buf = [0u8; 64];
        assert!(listener.read_frame(&mut buf).await.is_err());

        let (len, from) = listener.read_frame(&mut buf).await.unwrap();
        assert_eq!(len, 10);
        assert_eq!(from, source);
        assert_eq!(listener.read_attempts(), 2);
        assert_eq!(listener.pending(), 0);
    }

    #[tokio::test]
    async fn test_truncates_to_buffer() {
        let listener = MockListener::new("mock0");
        listener.inject_frame(MacAddr::UNSPECIFIED, vec![7; 300]);

        let mut buf = [0u8; 201];
        let (len, _) = listener.read_frame(&mut buf).await.unwrap();
        assert_eq!(len, 201);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_when_empty() {
        let listener = MockListener::new("mock0");
        let mut buf = [0u8; 16];

        let read = tokio::time::timeout(Duration::from_secs(5), listener.read_frame(&mut buf)).await;
        assert!(read.is_err());
        assert_eq!(listener.read_attempts(), 1);
    }
}
