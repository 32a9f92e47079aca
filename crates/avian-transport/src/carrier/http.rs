// ============================================
// File: crates/avian-transport/src/carrier/http.rs
// ============================================
//! # HTTP Carrier Client
//!
//! ## Creation Reason
//! Talks to a microblog REST API (v2 style) that serves as the message
//! relay: one endpoint to publish posts, one filtered stream to receive
//! them.
//!
//! ## Main Functionality
//! - `publish`: `POST {api_base}/2/tweets` with the user-context token
//! - `subscribe`: Register a stream rule, then read the NDJSON stream
//!   `GET {api_base}/2/tweets/search/stream` with the app token
//! - `HttpPostStream::stop`: Drop the response and delete the rule
//!
//! ## Main Logical Flow
//! ```text
//! subscribe("#in")
//!   ├─► POST /2/tweets/search/stream/rules {"add":[{"value":"#in"}]}
//!   └─► GET  /2/tweets/search/stream  ──►  chunk ─► LineBuffer ─► StreamItem
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The streaming client has no overall request timeout; only connect
//!   is bounded. The publish client uses the configured timeout
//! - HTTP 429 is mapped to `RateLimited`, never to `Rejected`
//! - Tokens are never logged; `Debug` output redacts them
//!
//! ## Last Modified
//! v0.1.0 - Initial HTTP carrier

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::carrier::models::{
    AddRulesRequest, CreatePostRequest, CreatePostResponse, DeleteRulesRequest, RuleIds,
    RuleSpec, RulesResponse,
};
use crate::carrier::stream::{parse_stream_line, LineBuffer};
use crate::error::{CarrierError, CarrierResult};
use crate::traits::{Carrier, PostId, PostStream, StreamItem};

/// Tag attached to stream rules registered by this client.
const RULE_TAG: &str = "avian";

// ============================================
// HttpCarrierSettings
// ============================================

/// Connection settings for [`HttpCarrier`].
#[derive(Clone)]
pub struct HttpCarrierSettings {
    /// API base URL, without trailing slash (e.g. `https://api.twitter.com`)
    pub api_base: String,
    /// User-context bearer token, required to publish
    pub user_token: Option<String>,
    /// App bearer token, required to subscribe
    pub app_token: Option<String>,
    /// Timeout for non-streaming requests
    pub request_timeout: Duration,
}

impl std::fmt::Debug for HttpCarrierSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCarrierSettings")
            .field("api_base", &self.api_base)
            .field("user_token", &self.user_token.as_ref().map(|_| "<redacted>"))
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// ============================================
// HttpCarrier
// ============================================

/// Carrier backed by the microblog REST API.
#[derive(Debug)]
pub struct HttpCarrier {
    settings: HttpCarrierSettings,
    http: Client,
    stream_http: Client,
}

impl HttpCarrier {
    /// Creates the client.
    ///
    /// # Errors
    /// Returns `Request` if the HTTP client cannot be built (TLS backend).
    pub fn new(mut settings: HttpCarrierSettings) -> CarrierResult<Self> {
        settings.api_base = settings.api_base.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| CarrierError::request(format!("failed to create HTTP client: {e}")))?;

        let stream_http = Client::builder()
            .connect_timeout(settings.request_timeout)
            .build()
            .map_err(|e| CarrierError::request(format!("failed to create HTTP client: {e}")))?;

        info!("HTTP carrier ready at {}", settings.api_base);

        Ok(Self {
            settings,
            http,
            stream_http,
        })
    }

    /// Returns the settings in use.
    #[must_use]
    pub const fn settings(&self) -> &HttpCarrierSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base, path)
    }

    fn user_token(&self) -> CarrierResult<&str> {
        self.settings
            .user_token
            .as_deref()
            .ok_or(CarrierError::MissingCredential { name: "user_token" })
    }

    fn app_token(&self) -> CarrierResult<&str> {
        self.settings
            .app_token
            .as_deref()
            .ok_or(CarrierError::MissingCredential { name: "app_token" })
    }

    async fn add_rule(&self, keyword: &str) -> CarrierResult<String> {
        let request = AddRulesRequest {
            add: vec![RuleSpec {
                value: keyword,
                tag: RULE_TAG,
            }],
        };

        let response = self
            .http
            .post(self.url("/2/tweets/search/stream/rules"))
            .bearer_auth(self.app_token()?)
            .json(&request)
            .send()
            .await?;

        let rules: RulesResponse = check_status(response).await?.json().await?;
        let id = rules
            .rule_id()
            .ok_or_else(|| CarrierError::decode("rules response carried no rule id"))?;

        debug!("Stream rule {} covers '{}'", id, keyword);
        Ok(id.to_string())
    }
}

#[async_trait]
impl Carrier for HttpCarrier {
    async fn publish(&self, text: &str) -> CarrierResult<PostId> {
        let response = self
            .http
            .post(self.url("/2/tweets"))
            .bearer_auth(self.user_token()?)
            .json(&CreatePostRequest { text })
            .send()
            .await?;

        let created: CreatePostResponse = check_status(response).await?.json().await?;
        Ok(created.data.id)
    }

    async fn subscribe(&self, keyword: &str) -> CarrierResult<Box<dyn PostStream>> {
        let token = self.app_token()?.to_string();
        let rule_id = self.add_rule(keyword).await?;

        let remover = RuleRemover {
            http: self.http.clone(),
            url: self.url("/2/tweets/search/stream/rules"),
            token: token.clone(),
            rule_id,
        };

        let opened = self
            .stream_http
            .get(self.url("/2/tweets/search/stream"))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(CarrierError::from);

        let response = match opened {
            Ok(response) => check_status(response).await,
            Err(e) => Err(e),
        };

        match response {
            Ok(response) => {
                info!("Subscribed to filtered stream for '{}'", keyword);
                Ok(Box::new(HttpPostStream {
                    response: Some(response),
                    lines: LineBuffer::new(),
                    remover: Some(remover),
                }))
            }
            Err(e) => {
                remover.remove().await;
                Err(e)
            }
        }
    }
}

/// Maps error statuses to `CarrierError`, passing successful responses
/// through.
async fn check_status(response: Response) -> CarrierResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(CarrierError::RateLimited { retry_after });
    }

    let body = response.text().await.unwrap_or_default();
    Err(CarrierError::rejected(status.as_u16(), body))
}

// ============================================
// HttpPostStream
// ============================================

/// Deletes a stream rule when the subscription ends.
#[derive(Debug)]
struct RuleRemover {
    http: Client,
    url: String,
    token: String,
    rule_id: String,
}

impl RuleRemover {
    async fn remove(self) {
        let request = DeleteRulesRequest {
            delete: RuleIds {
                ids: vec![self.rule_id.as_str()],
            },
        };

        let result = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(CarrierError::from);

        match result {
            Ok(response) => match check_status(response).await {
                Ok(_) => debug!("Deleted stream rule {}", self.rule_id),
                Err(e) => warn!("Failed to delete stream rule {}: {}", self.rule_id, e),
            },
            Err(e) => warn!("Failed to delete stream rule {}: {}", self.rule_id, e),
        }
    }
}

/// Open filtered stream over HTTP.
#[derive(Debug)]
pub struct HttpPostStream {
    response: Option<Response>,
    lines: LineBuffer,
    remover: Option<RuleRemover>,
}

#[async_trait]
impl PostStream for HttpPostStream {
    async fn next(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return Some(parse_stream_line(&line));
            }

            let response = self.response.as_mut()?;
            match response.chunk().await {
                Ok(Some(chunk)) => self.lines.extend(&chunk),
                Ok(None) => {
                    debug!("Filtered stream ended by carrier");
                    self.response = None;
                }
                Err(e) => {
                    warn!("Filtered stream read failed: {}", e);
                    self.response = None;
                }
            }
        }
    }

    async fn stop(&mut self) {
        self.response = None;
        if let Some(remover) = self.remover.take() {
            remover.remove().await;
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> HttpCarrierSettings {
        HttpCarrierSettings {
            api_base: "https://api.example.com/".into(),
            user_token: Some("user-secret".into()),
            app_token: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", settings());
        assert!(!debug.contains("user-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_url_building() {
        let carrier = HttpCarrier::new(settings()).unwrap();
        assert_eq!(carrier.url("/2/tweets"), "https://api.example.com/2/tweets");
    }

    #[tokio::test]
    async fn test_missing_app_token() {
        let carrier = HttpCarrier::new(settings()).unwrap();
        let err = carrier.subscribe("#in").await.err().unwrap();
        assert_eq!(err, CarrierError::MissingCredential { name: "app_token" });
    }
}
