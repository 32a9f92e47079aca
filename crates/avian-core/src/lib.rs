// ============================================
// File: crates/avian-core/src/lib.rs
// ============================================
//! # Avian Core - Codec & Framing Library
//!
//! ## Creation Reason
//! Holds every pure, I/O-free piece of the tunnel: how a captured frame is
//! unwrapped, how its payload becomes carrier-safe text, how that text is
//! checked, and how a received post turns back into an IP packet.
//!
//! ## Main Functionality
//!
//! ### Framing
//! - [`ethernet`]: Ethernet II frame parsing (incl. 802.1Q/802.1ad tags)
//! - [`packet`]: Minimal IPv4 header view over decoded bytes
//!
//! ### Text Codec
//! - [`codec`]: base64 text codec, post budget, `TextCodec`
//! - [`validator`]: `Validator` trait and the round-trip validator
//! - [`message`]: `EncodedMessage` and `CarrierPost`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               avian-tunnel                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    avian-core  ◄──     avian-transport             │
//! │    You are here               │                    │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              avian-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format on the Carrier
//! ```text
//! ┌──────────────────────────────┬───┬────────────────┬─────────────────┐
//! │ base64(payload)              │ ␠ │ routing label  │ carrier suffix  │
//! │ no '/' (reserved character)  │   │ e.g. #2_4_4_0  │ (ignored)       │
//! └──────────────────────────────┴───┴────────────────┴─────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Nothing in this crate may block or allocate sockets
//! - Decoding must stay a pure function of its input
//! - No TTL rewriting and no header checksum checks, on purpose
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod error;
pub mod ethernet;
pub mod message;
pub mod packet;
pub mod validator;

// Re-export commonly used items
pub use codec::{TextCodec, DEFAULT_MAX_POST_LEN, DEFAULT_MIN_PACKET_LEN, SEPARATOR};
pub use error::{CoreError, Result};
pub use ethernet::{EthernetFrame, ETHERTYPE_IPV4};
pub use message::{CarrierPost, EncodedMessage};
pub use packet::{Ipv4HeaderView, RawIpPacket};
pub use validator::{RoundTripValidator, Validator, DEFAULT_RESERVED_CHAR};
