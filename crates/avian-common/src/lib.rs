// ============================================
// File: crates/avian-common/src/lib.rs
// ============================================
//! # Avian Common - Shared Types Library
//!
//! ## Creation Reason
//! Provides the small set of value types shared by every avian crate, so
//! link addresses and routing labels mean the same thing on both sides of
//! the tunnel.
//!
//! ## Main Functionality
//! - [`types`]: `MacAddr`, `RoutingLabel`
//! - [`error`]: Common error type and result alias
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               avian-tunnel                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    avian-core          avian-transport             │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              avian-common  ◄── You are here        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - keep it dependency-light
//! - All public types implement Debug, Clone, Eq and Serialize
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{MacAddr, RoutingLabel};
