// ============================================
// File: crates/avian-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! The tunnel pipelines only ever see these interfaces. Real sockets and
//! the HTTP carrier sit behind them in production, in-memory mocks in
//! tests.
//!
//! ## Main Functionality
//! - `FrameListener`: Link-layer frame capture on one interface
//! - `RawSender`: Raw IPv4 injection addressed by destination
//! - `Carrier`: Publish text and open filtered subscriptions
//! - `PostStream`: One filtered subscription
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync; each pipeline task holds an
//!   `Arc` to its primitives
//! - `PostStream::next` returning `None` means the subscription is gone
//!   and must be reopened, not polled again
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::Ipv4Addr;

use async_trait::async_trait;

use avian_common::MacAddr;
use avian_core::CarrierPost;

use crate::error::{CarrierResult, Result};

/// Identifier the carrier assigns to a published post.
pub type PostId = String;

// ============================================
// FrameListener
// ============================================

/// Captures link-layer frames of one ether-type on one interface.
///
/// # Example
/// ```ignore
/// async fn capture<L: FrameListener>(listener: &L) -> Result<()> {
///     let mut buf = [0u8; 201];
///     loop {
///         let (len, source) = listener.read_frame(&mut buf).await?;
///         println!("{len} bytes from {source}");
///     }
/// }
/// ```
#[async_trait]
pub trait FrameListener: Send + Sync {
    /// Reads one frame into `buf`, truncating it to the buffer size.
    ///
    /// # Returns
    /// Tuple of (bytes copied, sender hardware address)
    ///
    /// # Errors
    /// Returns error if the read fails
    async fn read_frame(&self, buf: &mut [u8]) -> Result<(usize, MacAddr)>;

    /// Returns the interface name.
    fn interface(&self) -> &str;
}

// ============================================
// RawSender
// ============================================

/// Sends complete IPv4 packets, header included, to a destination.
#[async_trait]
pub trait RawSender: Send + Sync {
    /// Sends `packet` as-is towards `dest`.
    ///
    /// # Returns
    /// Number of bytes sent
    ///
    /// # Errors
    /// Returns error if the kernel refuses the packet
    async fn send_to(&self, packet: &[u8], dest: Ipv4Addr) -> Result<usize>;
}

// ============================================
// Carrier
// ============================================

/// One item read from a filtered subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// A post matching the subscription keyword.
    Post(CarrierPost),
    /// Anything else the carrier sends (keep-alives, notices).
    Other(String),
}

/// An open filtered subscription.
#[async_trait]
pub trait PostStream: Send {
    /// Waits for the next item. `None` once the subscription has ended.
    async fn next(&mut self) -> Option<StreamItem>;

    /// Ends the subscription and releases carrier-side resources.
    async fn stop(&mut self);
}

/// A message relay that accepts short text posts and offers keyword
/// subscriptions.
#[async_trait]
pub trait Carrier: Send + Sync {
    /// Publishes one post.
    ///
    /// # Errors
    /// `RateLimited` when the carrier is throttling us, any other
    /// `CarrierError` for the remaining failures
    async fn publish(&self, text: &str) -> CarrierResult<PostId>;

    /// Opens a subscription delivering posts that contain `keyword`.
    ///
    /// # Errors
    /// Returns error if the subscription cannot be established
    async fn subscribe(&self, keyword: &str) -> CarrierResult<Box<dyn PostStream>>;
}
