// ============================================
// File: crates/avian-tunnel/src/lib.rs
// ============================================
//! # Avian Tunnel Library
//!
//! ## Creation Reason
//! Wires the codec and the transport primitives into two independent
//! pipelines that carry IPv4 traffic over a public message relay.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Tunnel configuration
//! - [`tunnel`]: Orchestrator and shutdown
//! - [`pipeline`]: Capture encoder and carrier decoder
//!   - [`pipeline::encoder`]: Interface → carrier
//!   - [`pipeline::decoder`]: Carrier → raw socket
//!   - [`pipeline::outcome`]: Iteration outcomes and pauses
//! - [`error`]: Tunnel error types
//!
//! ## Data Flow
//! ```text
//! interface → Ethernet → base64 + label → publish → carrier
//! carrier → subscribe(label) → first token → base64 → raw socket
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - No encryption, no integrity, no ordering: posts are public
//! - Configuration changes require restart
//!
//! ## Last Modified
//! v0.1.0 - Initial tunnel library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod tunnel;

// Re-export primary types
pub use config::TunnelConfig;
pub use error::{Result, TunnelError};
pub use tunnel::{Tunnel, TunnelReport};
