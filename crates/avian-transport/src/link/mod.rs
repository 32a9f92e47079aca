// ============================================
// File: crates/avian-transport/src/link/mod.rs
// ============================================
//! # Link-Layer Capture Module
//!
//! ## Creation Reason
//! The encoder reads whole Ethernet frames off a physical interface,
//! filtered by ether-type, before any IP routing happens.
//!
//! ## Platform Implementations
//! - `linux`: `AF_PACKET` / `SOCK_RAW` socket bound to one interface
//! - `mock`: In-memory implementation for testing
//!
//! ```text
//! ┌──────────────┐   frames (ether-type 0x0800)   ┌────────────────┐
//! │  enp0s8      │ ─────────────────────────────► │ PacketListener │
//! │  (physical)  │                                │  read_frame()  │
//! └──────────────┘                                └────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Opening the socket requires root or CAP_NET_RAW
//! - Frames include the Ethernet header; parsing is done by the caller
//! - Interface names are limited to 15 characters on Linux
//!
//! ## Last Modified
//! v0.1.0 - Initial link module structure

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(target_os = "linux")]
pub use linux::PacketListener;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockListener;
