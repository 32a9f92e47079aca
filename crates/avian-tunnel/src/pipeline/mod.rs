// ============================================
// File: crates/avian-tunnel/src/pipeline/mod.rs
// ============================================
//! # Pipelines
//!
//! ## Main Functionality
//! - `encoder`: Capture encoder, interface → carrier
//! - `decoder`: Carrier decoder, carrier → raw socket
//! - `outcome`: Per-iteration outcomes and the pause table
//!
//! The two pipelines share nothing but the carrier handle and the
//! shutdown signal.

pub mod decoder;
pub mod encoder;
pub mod outcome;

pub use decoder::CarrierDecoder;
pub use encoder::CaptureEncoder;
pub use outcome::{Pacing, PipelineStats, Stage, StepOutcome};
