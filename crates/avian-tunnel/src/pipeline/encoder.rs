// ============================================
// File: crates/avian-tunnel/src/pipeline/encoder.rs
// ============================================
//! # Capture Encoder (device → carrier)
//!
//! ## Creation Reason
//! Moves captured IPv4 traffic onto the carrier: every frame read from
//! the interface becomes one post tagged with the destination label.
//!
//! ## Main Logical Flow
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ Listening │──►│ Decoding │──►│ Encoding │──►│ Publishing │──┐
//! └───────────┘   └──────────┘   └──────────┘   └────────────┘  │
//!       ▲   read error /   parse error /   validation /         │
//!       │   100 ms         100 ms          drop                 │
//!       └────────────────────────────────────────────────────────┘
//!                  publish ok: 750 ms / publish error: 10 s
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The read buffer is sized to the payload capacity of one post, so
//!   oversized frames are truncated by the read itself
//! - A failed publish is never retried; the next frame is processed
//!   after the failure pause
//! - Shutdown interrupts reads and pauses, never a publish in flight
//!
//! ## Last Modified
//! v0.1.0 - Initial encoder pipeline

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use avian_common::{MacAddr, RoutingLabel};
use avian_core::{EthernetFrame, TextCodec};
use avian_transport::error::Result as TransportResult;
use avian_transport::traits::{Carrier, FrameListener};

use crate::pipeline::outcome::{Pacing, PipelineStats, Stage, StepOutcome};

/// Reads frames, encodes their payloads and publishes them.
pub struct CaptureEncoder {
    listener: Arc<dyn FrameListener>,
    carrier: Arc<dyn Carrier>,
    codec: Arc<TextCodec>,
    label: RoutingLabel,
    pacing: Pacing,
    buf: Vec<u8>,
}

impl CaptureEncoder {
    /// Creates an encoder publishing under `label`.
    pub fn new(
        listener: Arc<dyn FrameListener>,
        carrier: Arc<dyn Carrier>,
        codec: Arc<TextCodec>,
        label: RoutingLabel,
        pacing: Pacing,
    ) -> Self {
        let capacity = codec.payload_capacity(&label);
        debug!(
            interface = listener.interface(),
            capacity, "Encoder read buffer sized to one post"
        );

        Self {
            listener,
            carrier,
            codec,
            label,
            pacing,
            buf: vec![0u8; capacity],
        }
    }

    /// Returns the frame read buffer size.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Runs one full iteration: read, parse, encode, publish.
    pub async fn step(&mut self) -> StepOutcome {
        let read = self.listener.read_frame(&mut self.buf).await;
        self.process(read).await
    }

    /// Runs until `shutdown` fires, returning the outcome counters.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> PipelineStats {
        let mut stats = PipelineStats::default();
        info!(
            "Capture encoder started on {} (label {})",
            self.listener.interface(),
            self.label
        );

        loop {
            let read = tokio::select! {
                _ = shutdown.recv() => break,
                read = self.listener.read_frame(&mut self.buf) => read,
            };

            let outcome = self.process(read).await;
            stats.record(&outcome);

            if let Some(pause) = self.pacing.pause_after(&outcome) {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        info!("Capture encoder stopped: {}", stats);
        stats
    }

    async fn process(&mut self, read: TransportResult<(usize, MacAddr)>) -> StepOutcome {
        let (len, source) = match read {
            Ok(read) => read,
            Err(e) => {
                warn!("Frame read failed on {}: {}", self.listener.interface(), e);
                return StepOutcome::Transient { stage: Stage::Read };
            }
        };

        let frame = match EthernetFrame::parse(&self.buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Unparseable frame from {}: {}", source, e);
                return StepOutcome::Transient { stage: Stage::Frame };
            }
        };

        let message = match self.codec.encode_message(frame.payload, &self.label) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping frame from {}: {}", source, e);
                return StepOutcome::Dropped {
                    stage: Stage::Validate,
                };
            }
        };

        match self.carrier.publish(message.text()).await {
            Ok(post_id) => {
                info!("from {}: {}", source, message);
                debug!(post_id = %post_id, len = frame.payload.len(), "Published frame");
                StepOutcome::Forwarded {
                    stage: Stage::Publish,
                }
            }
            Err(e) if e.is_rate_limited() => {
                warn!("Carrier rate limit hit, frame from {} lost: {}", source, e);
                StepOutcome::RateLimited
            }
            Err(e) => {
                error!("Publish failed, frame from {} lost: {}", source, e);
                StepOutcome::Transient {
                    stage: Stage::Publish,
                }
            }
        }
    }
}

impl std::fmt::Debug for CaptureEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEncoder")
            .field("interface", &self.listener.interface())
            .field("label", &self.label)
            .field("buffer_len", &self.buf.len())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use avian_core::codec;
    use avian_transport::carrier::MockCarrier;
    use avian_transport::error::CarrierError;
    use avian_transport::link::MockListener;

    use super::*;
    use crate::pipeline::outcome::DEFAULT_READ_RETRY;

    const SOURCE: MacAddr = MacAddr::new([0x08, 0x00, 0x27, 0x11, 0x22, 0x33]);

    fn ipv4_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0xff; 6];
        frame.extend_from_slice(&SOURCE.octets());
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(payload);
        frame
    }

    fn label(s: &str) -> RoutingLabel {
        RoutingLabel::new(s).unwrap()
    }

    fn encoder(
        listener: &Arc<MockListener>,
        carrier: &Arc<MockCarrier>,
        out: &str,
    ) -> CaptureEncoder {
        CaptureEncoder::new(
            Arc::clone(listener) as Arc<dyn FrameListener>,
            Arc::clone(carrier) as Arc<dyn Carrier>,
            Arc::new(TextCodec::new()),
            label(out),
            Pacing::default(),
        )
    }

    #[tokio::test]
    async fn test_publishes_tagged_payload() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let mut encoder = encoder(&listener, &carrier, "#2_4_4_0_24");

        let payload = vec![0x41u8; 64];
        listener.inject_frame(SOURCE, ipv4_frame(&payload));

        let outcome = encoder.step().await;
        assert_eq!(outcome, StepOutcome::Forwarded { stage: Stage::Publish });

        let published = carrier.published();
        assert_eq!(published.len(), 1);
        let (encoded, tag) = published[0].split_once(' ').unwrap();
        assert_eq!(encoded.len(), 88);
        assert!(!encoded.contains('/'));
        assert_eq!(tag, "#2_4_4_0_24");
        assert_eq!(codec::decode(encoded).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_buffer_sized_to_post() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let mut encoder = encoder(&listener, &carrier, "#2_4_4_0_24");
        assert_eq!(encoder.buffer_len(), 201);

        listener.inject_frame(SOURCE, ipv4_frame(&[0x41; 400]));
        assert!(encoder.step().await.is_forwarded());

        let published = carrier.published();
        assert!(published[0].chars().count() <= 280);
    }

    #[tokio::test]
    async fn test_reserved_char_dropped_without_publish() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let mut encoder = encoder(&listener, &carrier, "#out");

        listener.inject_frame(SOURCE, ipv4_frame(&[0xff; 64]));

        let outcome = encoder.step().await;
        assert_eq!(outcome, StepOutcome::Dropped { stage: Stage::Validate });
        assert!(carrier.publish_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_short_frame_is_transient() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let mut encoder = encoder(&listener, &carrier, "#out");

        listener.inject_frame(SOURCE, vec![0u8; 6]);
        assert_eq!(encoder.step().await, StepOutcome::Transient { stage: Stage::Frame });
    }

    #[tokio::test]
    async fn test_publish_failures() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let mut encoder = encoder(&listener, &carrier, "#out");

        carrier.fail_next_publish(CarrierError::RateLimited { retry_after: None });
        carrier.fail_next_publish(CarrierError::rejected(403, "duplicate content"));
        for _ in 0..2 {
            listener.inject_frame(SOURCE, ipv4_frame(&[0x41; 64]));
        }

        assert_eq!(encoder.step().await, StepOutcome::RateLimited);
        assert_eq!(encoder.step().await, StepOutcome::Transient { stage: Stage::Publish });
        assert!(carrier.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_retried_once_after_pause() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let encoder = encoder(&listener, &carrier, "#out");

        listener.inject_error("network is down");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(encoder.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(500)).await;

        let attempts = listener.attempt_times();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[1] - attempts[0] >= DEFAULT_READ_RETRY);
        assert!(!task.is_finished());

        shutdown_tx.send(()).unwrap();
        let stats = task.await.unwrap();
        assert_eq!(stats.transient, 1);
        assert_eq!(stats.forwarded, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_pauses_before_next_frame() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let encoder = encoder(&listener, &carrier, "#out");
        let pacing = Pacing::default();

        carrier.fail_next_publish(CarrierError::RateLimited { retry_after: None });
        listener.inject_frame(SOURCE, ipv4_frame(&[0x41; 64]));
        listener.inject_frame(SOURCE, ipv4_frame(&[0x42; 64]));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(encoder.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(12)).await;

        let publishes = carrier.publish_attempts();
        assert_eq!(publishes.len(), 2);
        assert!(publishes[1] - publishes[0] >= pacing.publish_interval * 10);

        let reads = listener.attempt_times();
        assert!(reads[1] - reads[0] >= pacing.publish_failure);
        assert_eq!(carrier.published().len(), 1);

        shutdown_tx.send(()).unwrap();
        let stats = task.await.unwrap();
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.forwarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_pause() {
        let listener = Arc::new(MockListener::new("mock0"));
        let carrier = Arc::new(MockCarrier::new());
        let encoder = encoder(&listener, &carrier, "#out");

        carrier.fail_next_publish(CarrierError::request("connection reset"));
        listener.inject_frame(SOURCE, ipv4_frame(&[0x41; 64]));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(encoder.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown_tx.send(()).unwrap();

        let stats = tokio::time::timeout(Duration::from_millis(10), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.transient, 1);
        assert_eq!(listener.read_attempts(), 1);
    }
}
