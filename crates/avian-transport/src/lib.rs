// ============================================
// File: crates/avian-transport/src/lib.rs
// ============================================
//! # Avian Transport - I/O Primitives
//!
//! ## Creation Reason
//! Isolates every side-effecting primitive the tunnel needs behind async
//! traits, so the pipelines can be tested without sockets, privileges or
//! network access.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `FrameListener`, `RawSender`, `Carrier`, `PostStream`
//! - [`link`]: Link-layer frame capture (Linux `AF_PACKET`)
//! - [`raw`]: Raw IPv4 injection (`IPPROTO_RAW`)
//! - [`carrier`]: Message relay client (HTTP)
//! - [`error`]: Transport and carrier error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 avian-tunnel                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │     avian-core         avian-transport             │
//! │                        You are here ◄──            │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              avian-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//!  interface ──► link::PacketListener ──► (encoder) ──► carrier.publish
//!  carrier.subscribe ──► (decoder) ──► raw::RawIpSocket ──► IP stack
//! ```
//!
//! ## Platform Support
//! | Platform | Listener | Raw socket | Carrier |
//! |----------|----------|------------|---------|
//! | Linux | ✅ | ✅ | ✅ |
//! | Others | ❌ | ❌ | ✅ |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Listener and raw socket require CAP_NET_RAW
//! - Mock implementations available with `mock` feature
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod carrier;
pub mod error;
pub mod link;
pub mod raw;
pub mod traits;

// Re-export primary types
pub use carrier::{HttpCarrier, HttpCarrierSettings};
pub use error::{CarrierError, CarrierResult, Result, TransportError};
pub use traits::{Carrier, FrameListener, PostId, PostStream, RawSender, StreamItem};

#[cfg(target_os = "linux")]
pub use link::PacketListener;
#[cfg(target_os = "linux")]
pub use raw::RawIpSocket;
