// ============================================
// File: crates/avian-tunnel/src/pipeline/outcome.rs
// ============================================
//! # Step Outcomes and Pacing
//!
//! ## Creation Reason
//! Every pipeline iteration ends in exactly one outcome. The pause that
//! follows depends only on that outcome, so timing rules can be tested
//! without running a loop.
//!
//! ## Pause Table
//! | Outcome | Pause |
//! |---------|-------|
//! | `Forwarded { Publish }` | `publish_interval` (750 ms) |
//! | `Forwarded { Send }` | none |
//! | `Transient { Read }` | `read_retry` (100 ms) |
//! | `Transient { Frame }` | `parse_retry` (100 ms) |
//! | `Transient { Publish }` | `publish_failure` (10 s) |
//! | `Transient { Subscribe }` | `resubscribe` (10 s) |
//! | `Transient { Send }` | none |
//! | `RateLimited` | `publish_failure` (10 s) |
//! | `Dropped { .. }` / `Resubscribed` | none |
//!
//! ## ⚠️ Important Note for Next Developer
//! - A rate-limited publish must never be followed by a shorter pause
//!   than `publish_failure`; config validation keeps it at least ten
//!   times `publish_interval`
//!
//! ## Last Modified
//! v0.1.0 - Initial outcome model

use std::fmt;
use std::time::Duration;

// ============================================
// Constants
// ============================================

/// Default pause after a failed frame read.
pub const DEFAULT_READ_RETRY: Duration = Duration::from_millis(100);

/// Default pause after a frame that could not be parsed.
pub const DEFAULT_PARSE_RETRY: Duration = Duration::from_millis(100);

/// Default pause after a successful publish.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(750);

/// Default pause after a failed or rate-limited publish.
pub const DEFAULT_PUBLISH_FAILURE: Duration = Duration::from_secs(10);

/// Default pause before reopening a lost subscription.
pub const DEFAULT_RESUBSCRIBE: Duration = Duration::from_secs(10);

// ============================================
// Stage
// ============================================

/// Where in a pipeline an iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading a frame from the interface.
    Read,
    /// Unwrapping the Ethernet frame.
    Frame,
    /// Encoding and validating the payload.
    Validate,
    /// Publishing to the carrier.
    Publish,
    /// Receiving from the subscription.
    Receive,
    /// Decoding a post into a packet.
    Decode,
    /// Sending the packet on the raw socket.
    Send,
    /// Opening the subscription.
    Subscribe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Frame => "frame",
            Self::Validate => "validate",
            Self::Publish => "publish",
            Self::Receive => "receive",
            Self::Decode => "decode",
            Self::Send => "send",
            Self::Subscribe => "subscribe",
        };
        f.write_str(name)
    }
}

// ============================================
// StepOutcome
// ============================================

/// Result of one pipeline iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The item made it through; `stage` is the final stage reached.
    Forwarded {
        /// Final stage
        stage: Stage,
    },
    /// A transient failure; the next iteration may succeed.
    Transient {
        /// Failing stage
        stage: Stage,
    },
    /// The carrier refused a publish because of its rate limit.
    RateLimited,
    /// The item was malformed or not tunnel traffic; discarded.
    Dropped {
        /// Stage that rejected it
        stage: Stage,
    },
    /// A lost subscription was reopened.
    Resubscribed,
}

impl StepOutcome {
    /// Returns `true` for `Forwarded`.
    #[must_use]
    pub const fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded { .. })
    }
}

// ============================================
// Pacing
// ============================================

/// Pause durations applied between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After a failed frame read.
    pub read_retry: Duration,
    /// After a frame that could not be parsed.
    pub parse_retry: Duration,
    /// After a successful publish.
    pub publish_interval: Duration,
    /// After a failed or rate-limited publish.
    pub publish_failure: Duration,
    /// Before reopening a lost subscription.
    pub resubscribe: Duration,
}

impl Pacing {
    /// Returns the pause owed after `outcome`, if any.
    #[must_use]
    pub const fn pause_after(&self, outcome: &StepOutcome) -> Option<Duration> {
        match outcome {
            StepOutcome::Forwarded {
                stage: Stage::Publish,
            } => Some(self.publish_interval),
            StepOutcome::Transient { stage } => match stage {
                Stage::Read => Some(self.read_retry),
                Stage::Frame => Some(self.parse_retry),
                Stage::Publish => Some(self.publish_failure),
                Stage::Subscribe => Some(self.resubscribe),
                _ => None,
            },
            StepOutcome::RateLimited => Some(self.publish_failure),
            StepOutcome::Forwarded { .. }
            | StepOutcome::Dropped { .. }
            | StepOutcome::Resubscribed => None,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            read_retry: DEFAULT_READ_RETRY,
            parse_retry: DEFAULT_PARSE_RETRY,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            publish_failure: DEFAULT_PUBLISH_FAILURE,
            resubscribe: DEFAULT_RESUBSCRIBE,
        }
    }
}

// ============================================
// PipelineStats
// ============================================

/// Outcome counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Items forwarded.
    pub forwarded: u64,
    /// Transient failures.
    pub transient: u64,
    /// Rate-limited publishes.
    pub rate_limited: u64,
    /// Items dropped.
    pub dropped: u64,
    /// Subscriptions reopened.
    pub resubscribed: u64,
}

impl PipelineStats {
    /// Counts one outcome.
    pub fn record(&mut self, outcome: &StepOutcome) {
        let counter = match outcome {
            StepOutcome::Forwarded { .. } => &mut self.forwarded,
            StepOutcome::Transient { .. } => &mut self.transient,
            StepOutcome::RateLimited => &mut self.rate_limited,
            StepOutcome::Dropped { .. } => &mut self.dropped,
            StepOutcome::Resubscribed => &mut self.resubscribed,
        };
        *counter += 1;
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "forwarded={} transient={} rate_limited={} dropped={} resubscribed={}",
            self.forwarded, self.transient, self.rate_limited, self.dropped, self.resubscribed
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_table() {
        let pacing = Pacing::default();

        let cases = [
            (StepOutcome::Forwarded { stage: Stage::Publish }, Some(DEFAULT_PUBLISH_INTERVAL)),
            (StepOutcome::Forwarded { stage: Stage::Send }, None),
            (StepOutcome::Transient { stage: Stage::Read }, Some(DEFAULT_READ_RETRY)),
            (StepOutcome::Transient { stage: Stage::Frame }, Some(DEFAULT_PARSE_RETRY)),
            (StepOutcome::Transient { stage: Stage::Publish }, Some(DEFAULT_PUBLISH_FAILURE)),
            (StepOutcome::Transient { stage: Stage::Subscribe }, Some(DEFAULT_RESUBSCRIBE)),
            (StepOutcome::Transient { stage: Stage::Send }, None),
            (StepOutcome::RateLimited, Some(DEFAULT_PUBLISH_FAILURE)),
            (StepOutcome::Dropped { stage: Stage::Validate }, None),
            (StepOutcome::Dropped { stage: Stage::Decode }, None),
            (StepOutcome::Resubscribed, None),
        ];

        for (outcome, expected) in cases {
            assert_eq!(pacing.pause_after(&outcome), expected, "{outcome:?}");
        }
    }

    #[test]
    fn test_rate_limit_pause_dominates_interval() {
        let pacing = Pacing::default();
        let limited = pacing.pause_after(&StepOutcome::RateLimited).unwrap();
        assert!(limited >= pacing.publish_interval * 10);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = PipelineStats::default();
        stats.record(&StepOutcome::Forwarded { stage: Stage::Publish });
        stats.record(&StepOutcome::RateLimited);
        stats.record(&StepOutcome::Dropped { stage: Stage::Decode });
        stats.record(&StepOutcome::Dropped { stage: Stage::Validate });

        assert_eq!(stats.forwarded, 1);
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.dropped, 2);
        assert!(stats.to_string().contains("dropped=2"));
    }
}
