// ============================================
// File: crates/avian-transport/src/carrier/mock.rs
// ============================================
//! # Mock Carrier
//!
//! ## Creation Reason
//! Drives both pipelines in tests without network access.
//!
//! ## Main Functionality
//! - Records every publish attempt (Tokio clock) and every accepted post
//! - Scripted publish and subscribe failures
//! - Keyword-filtered delivery to open subscriptions
//! - Optional loopback: accepted posts are delivered to matching
//!   subscriptions, so one mock can connect an encoder to a decoder
//! - `close_streams` ends every open subscription
//!
//! ## Last Modified
//! v0.1.0 - Initial mock carrier

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use avian_core::CarrierPost;

use crate::error::{CarrierError, CarrierResult};
use crate::traits::{Carrier, PostId, PostStream, StreamItem};

struct Subscriber {
    keyword: String,
    tx: mpsc::UnboundedSender<StreamItem>,
}

/// In-memory carrier for tests.
#[derive(Default)]
pub struct MockCarrier {
    loopback: bool,
    attempts: Mutex<Vec<Instant>>,
    published: Mutex<Vec<String>>,
    publish_failures: Mutex<VecDeque<CarrierError>>,
    subscribe_failures: Mutex<VecDeque<CarrierError>>,
    subscribers: Mutex<Vec<Subscriber>>,
    subscribe_calls: AtomicUsize,
    stops: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl MockCarrier {
    /// Creates a carrier that accepts every publish.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a carrier that delivers accepted posts to its own matching
    /// subscriptions.
    #[must_use]
    pub fn with_loopback() -> Self {
        Self {
            loopback: true,
            ..Self::default()
        }
    }

    /// Makes the next publish fail with `err`.
    pub fn fail_next_publish(&self, err: CarrierError) {
        self.publish_failures.lock().push_back(err);
    }

    /// Makes the next subscribe fail with `err`.
    pub fn fail_next_subscribe(&self, err: CarrierError) {
        self.subscribe_failures.lock().push_back(err);
    }

    /// Delivers an item to open subscriptions. Posts only reach
    /// subscriptions whose keyword they contain. Returns the number of
    /// subscriptions reached.
    pub fn deliver(&self, item: StreamItem) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !s.tx.is_closed());

        subscribers
            .iter()
            .filter(|s| match &item {
                StreamItem::Post(post) => post.text.contains(&s.keyword),
                StreamItem::Other(_) => true,
            })
            .filter(|s| s.tx.send(item.clone()).is_ok())
            .count()
    }

    /// Delivers a post with the given text.
    pub fn deliver_post(&self, text: impl Into<String>) -> usize {
        self.deliver(StreamItem::Post(CarrierPost::new(text)))
    }

    /// Ends every open subscription.
    pub fn close_streams(&self) {
        self.subscribers.lock().clear();
    }

    /// Returns the texts of all accepted posts.
    #[must_use]
    pub fn published(&self) -> Vec<String> {
        self.published.lock().clone()
    }

    /// Returns the instants of every publish attempt, failed or not.
    #[must_use]
    pub fn publish_attempts(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }

    /// Returns how many times `subscribe` has been called.
    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Returns how many subscriptions have been stopped.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Returns the number of subscriptions still open.
    #[must_use]
    pub fn open_subscriptions(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !s.tx.is_closed());
        subscribers.len()
    }
}

#[async_trait]
impl Carrier for MockCarrier {
    async fn publish(&self, text: &str) -> CarrierResult<PostId> {
        self.attempts.lock().push(Instant::now());

        if let Some(err) = self.publish_failures.lock().pop_front() {
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.published.lock().push(text.to_string());

        if self.loopback {
            self.deliver(StreamItem::Post(CarrierPost::with_id(id.clone(), text)));
        }

        Ok(id)
    }

    async fn subscribe(&self, keyword: &str) -> CarrierResult<Box<dyn PostStream>> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.subscribe_failures.lock().pop_front() {
            return Err(err);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(Subscriber {
            keyword: keyword.to_string(),
            tx,
        });

        Ok(Box::new(MockPostStream {
            rx,
            stopped: false,
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// Subscription handed out by [`MockCarrier`].
pub struct MockPostStream {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    stopped: bool,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl PostStream for MockPostStream {
    async fn next(&mut self) -> Option<StreamItem> {
        if self.stopped {
            return None;
        }
        self.rx.recv().await
    }

    async fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.rx.close();
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_filtering() {
        let carrier = MockCarrier::new();
        let mut inbound = carrier.subscribe("#in").await.unwrap();
        let mut other = carrier.subscribe("#elsewhere").await.unwrap();

        assert_eq!(carrier.deliver_post("QUJD #in"), 1);
        assert_eq!(carrier.deliver(StreamItem::Other("keep-alive".into())), 2);

        assert_eq!(
            inbound.next().await,
            Some(StreamItem::Post(CarrierPost::new("QUJD #in")))
        );
        assert_eq!(
            other.next().await,
            Some(StreamItem::Other("keep-alive".into()))
        );
    }

    #[tokio::test]
    async fn test_publish_failures_and_loopback() {
        let carrier = MockCarrier::with_loopback();
        let mut stream = carrier.subscribe("#out").await.unwrap();

        carrier.fail_next_publish(CarrierError::RateLimited { retry_after: None });
        assert!(carrier.publish("QUJD #out").await.unwrap_err().is_rate_limited());

        let id = carrier.publish("QUJD #out").await.unwrap();
        assert_eq!(carrier.published(), vec!["QUJD #out".to_string()]);
        assert_eq!(carrier.publish_attempts().len(), 2);

        match stream.next().await {
            Some(StreamItem::Post(post)) => assert_eq!(post.id, Some(id)),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_and_stop() {
        let carrier = MockCarrier::new();
        let mut stream = carrier.subscribe("#in").await.unwrap();
        assert_eq!(carrier.open_subscriptions(), 1);

        carrier.close_streams();
        assert_eq!(stream.next().await, None);

        let mut stream = carrier.subscribe("#in").await.unwrap();
        stream.stop().await;
        stream.stop().await;
        assert_eq!(stream.next().await, None);
        assert_eq!(carrier.stops(), 1);
        assert_eq!(carrier.subscribe_calls(), 2);
        assert_eq!(carrier.open_subscriptions(), 0);
    }
}
