// ============================================
// File: crates/avian-tunnel/src/tunnel.rs
// ============================================
//! # Tunnel Orchestrator
//!
//! ## Creation Reason
//! Opens the three primitives, starts both pipelines and coordinates
//! shutdown.
//!
//! ## Tunnel Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Tunnel                             │
//! │                                                              │
//! │  PacketListener ──► CaptureEncoder ──► publish ─┐            │
//! │                                                 ▼            │
//! │                                             Carrier          │
//! │                                                 │            │
//! │  RawIpSocket ◄──── CarrierDecoder ◄── subscribe ┘            │
//! │                                                              │
//! │  shutdown: broadcast<()> ─► both pipelines                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Needs CAP_NET_RAW (or root) for both sockets
//! - A rejected initial subscription stops startup; a retryable failure
//!   starts the decoder in backoff instead
//! - A shutdown requested before the pipelines start is remembered
//! - Tasks that miss the join timeout are left detached
//!
//! ## Last Modified
//! v0.1.0 - Initial tunnel orchestrator

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use avian_transport::traits::{Carrier, FrameListener, RawSender};

#[cfg(target_os = "linux")]
use avian_transport::{HttpCarrier, PacketListener, RawIpSocket, TransportError};

use crate::config::TunnelConfig;
use crate::error::{Result, TunnelError};
use crate::pipeline::decoder::STOP_TIMEOUT;
use crate::pipeline::{CaptureEncoder, CarrierDecoder, PipelineStats};

/// How long shutdown waits for each pipeline.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const _: () = assert!(STOP_TIMEOUT.as_millis() < SHUTDOWN_TIMEOUT.as_millis());

/// Outcome counters of both pipelines after shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunnelReport {
    /// Device → carrier.
    pub encoder: PipelineStats,
    /// Carrier → device.
    pub decoder: PipelineStats,
}

// ============================================
// Tunnel
// ============================================

/// Bidirectional packet tunnel over a message carrier.
///
/// # Lifecycle
/// 1. Create with `Tunnel::new(config)`
/// 2. Start with `tunnel.run().await`
/// 3. Stop with Ctrl+C or [`Tunnel::shutdown`]
pub struct Tunnel {
    config: Arc<TunnelConfig>,
    shutdown: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl Tunnel {
    /// Creates a tunnel from a validated configuration.
    #[must_use]
    pub fn new(config: TunnelConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config: Arc::new(config),
            shutdown: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    /// Opens the real primitives and runs until Ctrl+C.
    ///
    /// # Errors
    /// Returns `ConfigMissing` without credentials, `Transport` if a
    /// socket cannot be opened, or `Carrier` if the HTTP client cannot be
    /// built or the carrier rejects the first subscription.
    pub async fn run(&self) -> Result<TunnelReport> {
        let settings = self.config.carrier_settings()?;
        info!("Starting avian tunnel v{}", env!("CARGO_PKG_VERSION"));

        #[cfg(target_os = "linux")]
        {
            let iface = &self.config.interface;
            let listener =
                PacketListener::open(&iface.name, iface.ether_type).map_err(privilege_hint)?;
            let sender = RawIpSocket::open().map_err(privilege_hint)?;
            let carrier = HttpCarrier::new(settings)?;

            self.run_with(
                Arc::new(listener),
                Arc::new(sender),
                Arc::new(carrier),
                wait_for_ctrl_c(),
            )
            .await
        }

        #[cfg(not(target_os = "linux"))]
        {
            drop(settings);
            Err(TunnelError::startup_failed(
                "packet capture is only supported on Linux",
            ))
        }
    }

    /// Runs both pipelines over the given primitives until `signal`
    /// completes or [`shutdown`](Self::shutdown) is called.
    ///
    /// The track label is subscribed before the pipelines start. If the
    /// carrier is unreachable the decoder starts without a subscription
    /// and retries after the resubscribe pause.
    ///
    /// # Errors
    /// Returns `Carrier` if the carrier rejects the initial subscription.
    pub async fn run_with(
        &self,
        listener: Arc<dyn FrameListener>,
        sender: Arc<dyn RawSender>,
        carrier: Arc<dyn Carrier>,
        signal: impl Future<Output = ()> + Send,
    ) -> Result<TunnelReport> {
        let mut requested = self.shutdown_tx.subscribe();

        let codec = Arc::new(self.config.codec());
        let pacing = self.config.pacing();
        let track = self.config.labels.track.clone();
        let destination = self.config.labels.destination.clone();

        let encoder = CaptureEncoder::new(
            listener,
            Arc::clone(&carrier),
            Arc::clone(&codec),
            destination,
            pacing,
        );
        let decoder = CarrierDecoder::new(Arc::clone(&carrier), sender, codec, track.clone(), pacing);
        let decoder = match carrier.subscribe(track.as_str()).await {
            Ok(stream) => {
                info!("Subscribed to {}", track);
                decoder.with_stream(stream)
            }
            Err(e) => {
                let err = TunnelError::from(e);
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(
                    "Initial subscription to {} failed, retrying in {:?}: {}",
                    track, pacing.resubscribe, err
                );
                decoder.with_subscribe_backoff()
            }
        };

        let encoder_task = tokio::spawn(encoder.run(self.shutdown_tx.subscribe()));
        let decoder_task = tokio::spawn(decoder.run(self.shutdown_tx.subscribe()));

        info!("Tunnel started");

        if self.shutdown.load(Ordering::SeqCst) {
            info!("Shutdown requested before start");
        } else {
            tokio::select! {
                () = signal => info!("Received shutdown signal"),
                _ = requested.recv() => info!("Shutdown requested"),
            }
        }

        info!("Shutting down tunnel...");
        let _ = self.shutdown_tx.send(());

        let report = TunnelReport {
            encoder: join("encoder", encoder_task).await,
            decoder: join("decoder", decoder_task).await,
        };

        info!("Tunnel shutdown complete");
        Ok(report)
    }

    /// Triggers shutdown programmatically. Takes effect even if called
    /// before [`run`](Self::run) has started the pipelines.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for Tunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tunnel")
            .field("interface", &self.config.interface.name)
            .field("track", &self.config.labels.track)
            .field("destination", &self.config.labels.destination)
            .finish()
    }
}

async fn join(name: &str, task: JoinHandle<PipelineStats>) -> PipelineStats {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(stats)) => {
            debug!("Task '{}' completed", name);
            stats
        }
        Ok(Err(e)) => {
            warn!("Task '{}' failed: {}", name, e);
            PipelineStats::default()
        }
        Err(_) => {
            warn!("Task '{}' timed out during shutdown", name);
            PipelineStats::default()
        }
    }
}

#[cfg(target_os = "linux")]
fn privilege_hint(e: TransportError) -> TransportError {
    if e.requires_privileges() {
        warn!("Capture and raw sockets need root or CAP_NET_RAW");
    }
    e
}

#[cfg(target_os = "linux")]
async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use avian_common::MacAddr;
    use avian_core::codec;
    use avian_transport::carrier::MockCarrier;
    use avian_transport::error::CarrierError;
    use avian_transport::link::MockListener;
    use avian_transport::raw::MockRawSender;

    use super::*;
    use crate::pipeline::outcome::DEFAULT_RESUBSCRIBE;

    const SOURCE: MacAddr = MacAddr::new([0x08, 0x00, 0x27, 0x11, 0x22, 0x33]);

    fn ipv4_packet(dst: Ipv4Addr, len: usize) -> Vec<u8> {
        let mut packet = vec![0x5au8; len];
        packet[0] = 0x45;
        packet[8] = 64;
        packet[16..20].copy_from_slice(&dst.octets());
        packet
    }

    fn ethernet(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0xff; 6];
        frame.extend_from_slice(&SOURCE.octets());
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(payload);
        frame
    }

    fn config(track: &str, destination: &str) -> TunnelConfig {
        let mut config = TunnelConfig::default();
        config
            .apply_overrides(None, Some(track.into()), Some(destination.into()))
            .unwrap();
        config
    }

    async fn until(check: impl Fn() -> bool) {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_crosses_tunnel() {
        let tunnel = Tunnel::new(config("#loop", "#loop"));
        let listener = Arc::new(MockListener::new("veth0"));
        let sender = Arc::new(MockRawSender::new());
        let carrier = Arc::new(MockCarrier::with_loopback());

        let dst = Ipv4Addr::new(10, 0, 0, 9);
        let packet = ipv4_packet(dst, 64);
        listener.inject_frame(SOURCE, ethernet(&packet));

        let watched = Arc::clone(&sender);
        let report = tunnel
            .run_with(
                Arc::clone(&listener) as Arc<dyn FrameListener>,
                Arc::clone(&sender) as Arc<dyn RawSender>,
                Arc::clone(&carrier) as Arc<dyn Carrier>,
                until(move || watched.sent_count() == 1),
            )
            .await
            .unwrap();

        let sent = sender.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].dest, dst);
        assert_eq!(sent[0].bytes, packet);

        assert_eq!(carrier.published(), vec![format!("{} #loop", codec::encode(&packet))]);
        assert_eq!(report.encoder.forwarded, 1);
        assert_eq!(report.decoder.forwarded, 1);
        assert_eq!(carrier.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_labels_are_independent() {
        let tunnel = Tunnel::new(config("#in", "#out"));
        let listener = Arc::new(MockListener::new("veth0"));
        let sender = Arc::new(MockRawSender::new());
        let carrier = Arc::new(MockCarrier::with_loopback());

        listener.inject_frame(SOURCE, ethernet(&ipv4_packet(Ipv4Addr::new(10, 0, 0, 1), 64)));
        let inbound = ipv4_packet(Ipv4Addr::new(10, 0, 0, 2), 64);

        let (watched_carrier, watched_sender) = (Arc::clone(&carrier), Arc::clone(&sender));
        let signal = async move {
            until(|| watched_carrier.published().len() == 1).await;
            // our own "#out" post never reaches the "#in" subscription
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(watched_sender.sent_count(), 0);

            watched_carrier.deliver_post(format!("{} #in", codec::encode(&inbound)));
            until(|| watched_sender.sent_count() == 1).await;
        };

        tunnel
            .run_with(
                Arc::clone(&listener) as Arc<dyn FrameListener>,
                Arc::clone(&sender) as Arc<dyn RawSender>,
                Arc::clone(&carrier) as Arc<dyn Carrier>,
                signal,
            )
            .await
            .unwrap();

        assert!(carrier.published()[0].ends_with(" #out"));
        let sent = sender.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].dest, Ipv4Addr::new(10, 0, 0, 2));
    }

    #[tokio::test]
    async fn test_rejected_initial_subscribe_is_fatal() {
        let tunnel = Tunnel::new(TunnelConfig::default());
        let carrier = Arc::new(MockCarrier::new());
        carrier.fail_next_subscribe(CarrierError::Rejected {
            status: 401,
            body: "Unauthorized".into(),
        });

        let result = tunnel
            .run_with(
                Arc::new(MockListener::new("veth0")),
                Arc::new(MockRawSender::new()),
                Arc::clone(&carrier) as Arc<dyn Carrier>,
                std::future::pending(),
            )
            .await;

        match result {
            Err(e @ TunnelError::Carrier(CarrierError::Rejected { status: 401, .. })) => {
                assert!(e.is_fatal());
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(carrier.subscribe_calls(), 1);
        assert!(carrier.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_carrier_at_startup_is_retried() {
        let tunnel = Tunnel::new(config("#in", "#out"));
        let sender = Arc::new(MockRawSender::new());
        let carrier = Arc::new(MockCarrier::new());
        carrier.fail_next_subscribe(CarrierError::request("connection refused"));

        let inbound = ipv4_packet(Ipv4Addr::new(10, 0, 0, 3), 64);
        let (watched_carrier, watched_sender) = (Arc::clone(&carrier), Arc::clone(&sender));
        let signal = async move {
            let started = tokio::time::Instant::now();
            until(|| watched_carrier.subscribe_calls() == 2).await;
            assert!(started.elapsed() >= DEFAULT_RESUBSCRIBE);

            until(|| watched_carrier.open_subscriptions() == 1).await;
            watched_carrier.deliver_post(format!("{} #in", codec::encode(&inbound)));
            until(|| watched_sender.sent_count() == 1).await;
        };

        let report = tunnel
            .run_with(
                Arc::new(MockListener::new("veth0")),
                Arc::clone(&sender) as Arc<dyn RawSender>,
                Arc::clone(&carrier) as Arc<dyn Carrier>,
                signal,
            )
            .await
            .unwrap();

        assert_eq!(sender.take_sent()[0].dest, Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(report.decoder.resubscribed, 1);
        assert_eq!(report.decoder.forwarded, 1);
        assert_eq!(carrier.stops(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_run_is_honoured() {
        let tunnel = Tunnel::new(TunnelConfig::default());
        let carrier = Arc::new(MockCarrier::new());
        tunnel.shutdown();

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            tunnel.run_with(
                Arc::new(MockListener::new("veth0")),
                Arc::new(MockRawSender::new()),
                Arc::clone(&carrier) as Arc<dyn Carrier>,
                std::future::pending(),
            ),
        )
        .await
        .expect("run_with ignored the earlier shutdown")
        .unwrap();

        assert_eq!(report, TunnelReport::default());
        assert_eq!(carrier.stops(), 1);
    }

    #[tokio::test]
    async fn test_programmatic_shutdown() {
        let tunnel = Arc::new(Tunnel::new(TunnelConfig::default()));
        let carrier = Arc::new(MockCarrier::new());

        let runner = Arc::clone(&tunnel);
        let watched = Arc::clone(&carrier);
        let task = tokio::spawn(async move {
            runner
                .run_with(
                    Arc::new(MockListener::new("veth0")),
                    Arc::new(MockRawSender::new()),
                    watched as Arc<dyn Carrier>,
                    std::future::pending(),
                )
                .await
        });

        until(|| carrier.subscribe_calls() == 1).await;
        tokio::task::yield_now().await;
        tunnel.shutdown();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report, TunnelReport::default());
        assert_eq!(carrier.stops(), 1);
    }

    #[tokio::test]
    async fn test_run_requires_credentials() {
        let tunnel = Tunnel::new(TunnelConfig::default());
        match tunnel.run().await {
            Err(TunnelError::ConfigMissing { field }) => assert_eq!(field, "carrier.user_token"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
