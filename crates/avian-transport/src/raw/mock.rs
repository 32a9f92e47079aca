// ============================================
// File: crates/avian-transport/src/raw/mock.rs
// ============================================
//! # Mock Raw Sender
//!
//! Captures packets instead of sending them. Failures can be scripted
//! per call.
//!
//! ## Last Modified
//! v0.1.0 - Initial mock sender

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Result, TransportError};
use crate::traits::RawSender;

/// A packet captured by [`MockRawSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    /// Destination passed to `send_to`.
    pub dest: Ipv4Addr,
    /// Packet bytes.
    pub bytes: Vec<u8>,
}

/// In-memory raw sender for tests.
#[derive(Debug, Default)]
pub struct MockRawSender {
    sent: Mutex<Vec<SentPacket>>,
    failures: Mutex<VecDeque<String>>,
}

impl MockRawSender {
    /// Creates a sender that accepts every packet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `send_to` call fail with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.failures.lock().push_back(reason.into());
    }

    /// Takes all packets sent so far.
    #[must_use]
    pub fn take_sent(&self) -> Vec<SentPacket> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Returns the number of packets sent so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl RawSender for MockRawSender {
    async fn send_to(&self, packet: &[u8], dest: Ipv4Addr) -> Result<usize> {
        if let Some(reason) = self.failures.lock().pop_front() {
            return Err(TransportError::send_failed(dest, reason));
        }

        self.sent.lock().push(SentPacket {
            dest,
            bytes: packet.to_vec(),
        });
        Ok(packet.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_and_fails() {
        let sender = MockRawSender::new();
        let dest = Ipv4Addr::new(10, 0, 0, 1);

        sender.fail_next("no route to host");
        assert!(sender.send_to(&[1, 2, 3], dest).await.is_err());
        assert_eq!(sender.send_to(&[1, 2, 3], dest).await.unwrap(), 3);

        let sent = sender.take_sent();
        assert_eq!(sent, vec![SentPacket { dest, bytes: vec![1, 2, 3] }]);
        assert_eq!(sender.sent_count(), 0);
    }
}
