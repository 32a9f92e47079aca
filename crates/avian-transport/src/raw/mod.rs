// ============================================
// File: crates/avian-transport/src/raw/mod.rs
// ============================================
//! # Raw IP Injection Module
//!
//! ## Creation Reason
//! Decoded packets already carry a complete IPv4 header. They are handed
//! to the kernel unchanged through an `IPPROTO_RAW` socket, which routes
//! them by their destination address.
//!
//! ## Platform Implementations
//! - `linux`: `AF_INET` / `SOCK_RAW` / `IPPROTO_RAW` via socket2
//! - `mock`: Records sent packets for testing
//!
//! ## ⚠️ Important Note for Next Developer
//! - Opening the socket requires root or CAP_NET_RAW
//! - `IPPROTO_RAW` implies `IP_HDRINCL`; the kernel fills in only the
//!   checksum and, when zero, the identification and source fields
//!
//! ## Last Modified
//! v0.1.0 - Initial raw module structure

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(target_os = "linux")]
pub use linux::RawIpSocket;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRawSender, SentPacket};
