// ============================================
// File: crates/avian-tunnel/src/pipeline/decoder.rs
// ============================================
//! # Carrier Decoder (carrier → device)
//!
//! ## Creation Reason
//! Turns posts from the filtered subscription back into IPv4 packets and
//! re-injects them through the raw socket.
//!
//! ## Main Logical Flow
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────┐   ┌──────────────┐
//! │ Subscribed │──►│ TypeChecking │──►│ Decoding │──►│ Address │──►│ Transmitting │
//! └────────────┘   └──────────────┘   └──────────┘   └─────────┘   └──────────────┘
//!       ▲  not a post: drop │   bad / short: drop │                 send error: log │
//!       └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stream closed: wait `resubscribe`, open a new subscription for the
//! same keyword, repeat until it succeeds. A decoder built with
//! [`CarrierDecoder::with_subscribe_backoff`] waits once before its first
//! attempt.
//!
//! ## ⚠️ Important Note for Next Developer
//! - No throttle on this side
//! - Stopping the subscription is bounded by [`STOP_TIMEOUT`]; the tunnel
//!   gives up on the pipelines after a longer grace period
//! - The TTL is sent as received; two tunnel ends tracking each other's
//!   labels can bounce a packet forever
//!
//! ## Last Modified
//! v0.1.0 - Initial decoder pipeline

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use avian_common::RoutingLabel;
use avian_core::{CarrierPost, TextCodec};
use avian_transport::carrier::stream::KEEP_ALIVE;
use avian_transport::traits::{Carrier, PostStream, RawSender, StreamItem};

use crate::pipeline::outcome::{Pacing, PipelineStats, Stage, StepOutcome};

/// Upper bound on removing the carrier-side rule at shutdown.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Receives posts, decodes them and transmits the packets.
pub struct CarrierDecoder {
    carrier: Arc<dyn Carrier>,
    sender: Arc<dyn RawSender>,
    codec: Arc<TextCodec>,
    label: RoutingLabel,
    pacing: Pacing,
    stream: Option<Box<dyn PostStream>>,
    initial_pause: Option<Duration>,
}

impl CarrierDecoder {
    /// Creates a decoder tracking `label`. Without [`with_stream`]
    /// the first iteration opens the subscription.
    ///
    /// [`with_stream`]: Self::with_stream
    pub fn new(
        carrier: Arc<dyn Carrier>,
        sender: Arc<dyn RawSender>,
        codec: Arc<TextCodec>,
        label: RoutingLabel,
        pacing: Pacing,
    ) -> Self {
        Self {
            carrier,
            sender,
            codec,
            label,
            pacing,
            stream: None,
            initial_pause: None,
        }
    }

    /// Uses an already opened subscription.
    #[must_use]
    pub fn with_stream(mut self, stream: Box<dyn PostStream>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Waits `resubscribe` before the first subscription attempt, as if
    /// a previous attempt had just failed.
    #[must_use]
    pub fn with_subscribe_backoff(mut self) -> Self {
        self.initial_pause = Some(self.pacing.resubscribe);
        self
    }

    /// Returns `true` while a subscription is open.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.stream.is_some()
    }

    /// Runs one iteration: receive and handle one item, or reopen the
    /// subscription if there is none.
    pub async fn step(&mut self) -> StepOutcome {
        let item = match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => return self.resubscribe().await,
        };
        self.handle(item).await
    }

    /// Runs until `shutdown` fires, then stops the subscription.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> PipelineStats {
        let mut stats = PipelineStats::default();
        let mut pause = self.initial_pause.take();
        info!("Carrier decoder started (tracking {})", self.label);

        loop {
            if let Some(pause) = pause.take() {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    () = tokio::time::sleep(pause) => {}
                }
            }

            let outcome = if let Some(stream) = self.stream.as_mut() {
                let item = tokio::select! {
                    _ = shutdown.recv() => break,
                    item = stream.next() => item,
                };
                self.handle(item).await
            } else {
                self.resubscribe().await
            };
            stats.record(&outcome);
            pause = self.pacing.pause_after(&outcome);
        }

        if let Some(mut stream) = self.stream.take() {
            if tokio::time::timeout(STOP_TIMEOUT, stream.stop()).await.is_err() {
                warn!(
                    "Stopping subscription for {} timed out, carrier rule may remain",
                    self.label
                );
            }
        }

        info!("Carrier decoder stopped: {}", stats);
        stats
    }

    async fn handle(&mut self, item: Option<StreamItem>) -> StepOutcome {
        match item {
            None => {
                warn!("Subscription for {} closed by carrier", self.label);
                self.stream = None;
                StepOutcome::Transient {
                    stage: Stage::Subscribe,
                }
            }
            Some(StreamItem::Other(text)) => {
                if text == KEEP_ALIVE {
                    trace!("Carrier keep-alive");
                } else {
                    warn!("Ignoring non-post carrier message: {}", text);
                }
                StepOutcome::Dropped {
                    stage: Stage::Receive,
                }
            }
            Some(StreamItem::Post(post)) => self.transmit(&post).await,
        }
    }

    async fn transmit(&mut self, post: &CarrierPost) -> StepOutcome {
        let packet = match self.codec.decode_post(&post.text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Dropping post {}: {}", post.id.as_deref().unwrap_or("-"), e);
                return StepOutcome::Dropped {
                    stage: Stage::Decode,
                };
            }
        };

        let dest = packet.destination();
        match self.sender.send_to(packet.as_bytes(), dest).await {
            Ok(sent) => {
                info!("to {}: {}", dest, post.token());
                debug!(len = sent, ttl = packet.header().ttl, "Transmitted packet");
                StepOutcome::Forwarded { stage: Stage::Send }
            }
            Err(e) => {
                error!("Raw send to {} failed: {}", dest, e);
                StepOutcome::Transient { stage: Stage::Send }
            }
        }
    }

    async fn resubscribe(&mut self) -> StepOutcome {
        match self.carrier.subscribe(self.label.as_str()).await {
            Ok(stream) => {
                info!("Subscribed to {}", self.label);
                self.stream = Some(stream);
                StepOutcome::Resubscribed
            }
            Err(e) => {
                error!("Subscribing to {} failed: {}", self.label, e);
                StepOutcome::Transient {
                    stage: Stage::Subscribe,
                }
            }
        }
    }
}

impl std::fmt::Debug for CarrierDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierDecoder")
            .field("label", &self.label)
            .field("subscribed", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
