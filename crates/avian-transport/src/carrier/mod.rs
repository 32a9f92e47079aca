// ============================================
// File: crates/avian-transport/src/carrier/mod.rs
// ============================================
//! # Carrier Module
//!
//! ## Creation Reason
//! The carrier is the public message relay the tunnel rides on. It only
//! has to publish short text posts and stream back posts that contain a
//! keyword.
//!
//! ## Implementations
//! - `http`: Microblog REST API client (reqwest, NDJSON stream)
//! - `mock`: In-memory carrier for testing
//!
//! ## ⚠️ Important Note for Next Developer
//! - Carriers rate-limit publishing; callers must back off on
//!   `CarrierError::RateLimited`
//!
//! ## Last Modified
//! v0.1.0 - Initial carrier module

pub mod http;
pub mod models;
pub mod stream;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::{HttpCarrier, HttpCarrierSettings, HttpPostStream};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCarrier, MockPostStream};
