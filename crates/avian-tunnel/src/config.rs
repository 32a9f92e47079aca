// ============================================
// File: crates/avian-tunnel/src/config.rs
// ============================================
//! # Tunnel Configuration
//!
//! ## Creation Reason
//! Groups every tunable of the tunnel (interface, labels, codec limits,
//! pacing, carrier credentials, logging) in one TOML document.
//!
//! ## Main Functionality
//! - `TunnelConfig`: Main configuration structure
//! - TOML loading and validation
//! - Environment and command line overrides
//! - Conversion into codec, pacing and carrier settings
//!
//! ## Example Configuration
//! ```toml
//! [interface]
//! name = "enp0s8"
//!
//! [labels]
//! track = "#2_4_4_0_24"
//! destination = "#2_4_4_0_24"
//!
//! [pacing]
//! publish_interval_ms = 750
//! publish_failure_ms = 10000
//!
//! [carrier]
//! api_base = "https://api.twitter.com"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Tokens should come from `AVIAN_USER_TOKEN` / `AVIAN_APP_TOKEN`
//!   rather than the file
//! - Never log the raw config; use `to_toml_redacted`
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use avian_common::RoutingLabel;
use avian_core::{
    RoundTripValidator, TextCodec, DEFAULT_MAX_POST_LEN, DEFAULT_MIN_PACKET_LEN,
    DEFAULT_RESERVED_CHAR, ETHERTYPE_IPV4,
};
use avian_transport::HttpCarrierSettings;

use crate::error::{Result, TunnelError};
use crate::pipeline::Pacing;

/// Environment variable holding the user-context token.
pub const ENV_USER_TOKEN: &str = "AVIAN_USER_TOKEN";

/// Environment variable holding the app token.
pub const ENV_APP_TOKEN: &str = "AVIAN_APP_TOKEN";

/// Smallest accepted `codec.min_packet_len` (an IPv4 header).
const MIN_PACKET_FLOOR: usize = 20;

/// Longest interface name the kernel accepts.
const MAX_IFNAME_LEN: usize = 15;

const REDACTED: &str = "<redacted>";

// ============================================
// TunnelConfig
// ============================================

/// Main tunnel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Capture interface.
    #[serde(default)]
    pub interface: InterfaceConfig,

    /// Routing labels.
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Codec limits.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Pipeline pauses.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Carrier endpoint and credentials.
    #[serde(default)]
    pub carrier: CarrierConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TunnelConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TunnelError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TunnelError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// # Errors
    /// Returns error if parsing or validation fails.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TunnelError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.interface.validate()?;
        self.codec.validate()?;
        self.pacing.validate()?;
        self.carrier.validate()?;

        if self.codec().payload_capacity(&self.labels.destination) == 0 {
            return Err(TunnelError::config_invalid(
                "labels.destination",
                format!("leaves no room for payload within {} characters", self.codec.max_post_len),
            ));
        }

        Ok(())
    }

    /// Fills missing tokens from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Fills missing tokens using `lookup`. Values already in the file
    /// win; empty values count as missing.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fill_token(&mut self.carrier.user_token, lookup(ENV_USER_TOKEN));
        fill_token(&mut self.carrier.app_token, lookup(ENV_APP_TOKEN));
    }

    /// Applies command line overrides, then re-validates.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` for an empty label or an invalid result.
    pub fn apply_overrides(
        &mut self,
        ifname: Option<String>,
        track: Option<String>,
        destination: Option<String>,
    ) -> Result<()> {
        if let Some(name) = ifname {
            self.interface.name = name;
        }
        if let Some(label) = track {
            self.labels.track = RoutingLabel::new(label)
                .map_err(|e| TunnelError::config_invalid("labels.track", e.to_string()))?;
        }
        if let Some(label) = destination {
            self.labels.destination = RoutingLabel::new(label)
                .map_err(|e| TunnelError::config_invalid("labels.destination", e.to_string()))?;
        }
        self.validate()
    }

    /// Builds the codec described by the `codec` section.
    #[must_use]
    pub fn codec(&self) -> TextCodec {
        TextCodec::new()
            .with_validator(Box::new(RoundTripValidator::new(self.codec.reserved_char)))
            .with_min_packet_len(self.codec.min_packet_len)
            .with_max_post_len(self.codec.max_post_len)
    }

    /// Returns the pipeline pauses.
    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        self.pacing.to_pacing()
    }

    /// Builds carrier settings.
    ///
    /// # Errors
    /// Returns `ConfigMissing` if either token is absent.
    pub fn carrier_settings(&self) -> Result<HttpCarrierSettings> {
        let user_token = required_token(self.carrier.user_token.as_ref(), "carrier.user_token")?;
        let app_token = required_token(self.carrier.app_token.as_ref(), "carrier.app_token")?;

        Ok(HttpCarrierSettings {
            api_base: self.carrier.api_base.clone(),
            user_token: Some(user_token),
            app_token: Some(app_token),
            request_timeout: Duration::from_secs(self.carrier.request_timeout_secs),
        })
    }

    /// Serializes to TOML with credentials replaced.
    #[must_use]
    pub fn to_toml_redacted(&self) -> String {
        let mut copy = self.clone();
        for token in [&mut copy.carrier.user_token, &mut copy.carrier.app_token] {
            if token.as_ref().is_some_and(|t| !t.is_empty()) {
                *token = Some(REDACTED.to_string());
            }
        }
        toml::to_string_pretty(&copy).unwrap_or_default()
    }
}

fn fill_token(slot: &mut Option<String>, value: Option<String>) {
    if slot.as_ref().map_or(true, String::is_empty) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = Some(value);
        }
    }
}

fn required_token(token: Option<&String>, field: &str) -> Result<String> {
    token
        .filter(|t| !t.is_empty())
        .cloned()
        .ok_or_else(|| TunnelError::config_missing(field))
}

// ============================================
// InterfaceConfig
// ============================================

/// Capture interface section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface to capture from.
    #[serde(default = "default_ifname")]
    pub name: String,

    /// EtherType to capture.
    #[serde(default = "default_ether_type")]
    pub ether_type: u16,
}

fn default_ifname() -> String {
    "enp0s8".to_string()
}

fn default_ether_type() -> u16 {
    ETHERTYPE_IPV4
}

impl InterfaceConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TunnelError::config_invalid("interface.name", "cannot be empty"));
        }

        if self.name.len() > MAX_IFNAME_LEN {
            return Err(TunnelError::config_invalid(
                "interface.name",
                format!("cannot exceed {MAX_IFNAME_LEN} characters"),
            ));
        }

        Ok(())
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            name: default_ifname(),
            ether_type: default_ether_type(),
        }
    }
}

// ============================================
// LabelsConfig
// ============================================

/// Routing labels section. Labels cannot be empty; deserialization
/// rejects an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelsConfig {
    /// Keyword the decoder subscribes to.
    #[serde(default)]
    pub track: RoutingLabel,

    /// Tag appended to outgoing posts.
    #[serde(default)]
    pub destination: RoutingLabel,
}

// ============================================
// CodecConfig
// ============================================

/// Codec section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Character a valid encoding must not contain.
    #[serde(default = "default_reserved_char")]
    pub reserved_char: char,

    /// Decoded posts shorter than this are dropped.
    #[serde(default = "default_min_packet_len")]
    pub min_packet_len: usize,

    /// Carrier post length limit, in characters.
    #[serde(default = "default_max_post_len")]
    pub max_post_len: usize,
}

fn default_reserved_char() -> char {
    DEFAULT_RESERVED_CHAR
}

fn default_min_packet_len() -> usize {
    DEFAULT_MIN_PACKET_LEN
}

fn default_max_post_len() -> usize {
    DEFAULT_MAX_POST_LEN
}

impl CodecConfig {
    fn validate(&self) -> Result<()> {
        if self.min_packet_len < MIN_PACKET_FLOOR {
            return Err(TunnelError::config_invalid(
                "codec.min_packet_len",
                format!("must be at least {MIN_PACKET_FLOOR}"),
            ));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            reserved_char: default_reserved_char(),
            min_packet_len: default_min_packet_len(),
            max_post_len: default_max_post_len(),
        }
    }
}

// ============================================
// PacingConfig
// ============================================

/// Pacing section, all values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after a failed read.
    #[serde(default = "default_read_retry_ms")]
    pub read_retry_ms: u64,

    /// Pause after an unparseable frame.
    #[serde(default = "default_parse_retry_ms")]
    pub parse_retry_ms: u64,

    /// Pause after a successful publish.
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    /// Pause after a failed or rate-limited publish.
    #[serde(default = "default_publish_failure_ms")]
    pub publish_failure_ms: u64,

    /// Pause before reopening a lost subscription.
    #[serde(default = "default_resubscribe_ms")]
    pub resubscribe_ms: u64,
}

fn default_read_retry_ms() -> u64 {
    100
}

fn default_parse_retry_ms() -> u64 {
    100
}

fn default_publish_interval_ms() -> u64 {
    750
}

fn default_publish_failure_ms() -> u64 {
    10_000
}

fn default_resubscribe_ms() -> u64 {
    10_000
}

impl PacingConfig {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("pacing.read_retry_ms", self.read_retry_ms),
            ("pacing.parse_retry_ms", self.parse_retry_ms),
            ("pacing.publish_interval_ms", self.publish_interval_ms),
            ("pacing.publish_failure_ms", self.publish_failure_ms),
            ("pacing.resubscribe_ms", self.resubscribe_ms),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(TunnelError::config_invalid(field, "must be greater than 0"));
            }
        }

        if self.publish_failure_ms < self.publish_interval_ms.saturating_mul(10) {
            return Err(TunnelError::config_invalid(
                "pacing.publish_failure_ms",
                "must be at least 10 times publish_interval_ms",
            ));
        }

        Ok(())
    }

    const fn to_pacing(&self) -> Pacing {
        Pacing {
            read_retry: Duration::from_millis(self.read_retry_ms),
            parse_retry: Duration::from_millis(self.parse_retry_ms),
            publish_interval: Duration::from_millis(self.publish_interval_ms),
            publish_failure: Duration::from_millis(self.publish_failure_ms),
            resubscribe: Duration::from_millis(self.resubscribe_ms),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            read_retry_ms: default_read_retry_ms(),
            parse_retry_ms: default_parse_retry_ms(),
            publish_interval_ms: default_publish_interval_ms(),
            publish_failure_ms: default_publish_failure_ms(),
            resubscribe_ms: default_resubscribe_ms(),
        }
    }
}

// ============================================
// CarrierConfig
// ============================================

/// Carrier section.
#[derive(Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// User-context bearer token (publishing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,

    /// App bearer token (subscribing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_token: Option<String>,

    /// Timeout for non-streaming requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.twitter.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl CarrierConfig {
    fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(TunnelError::config_invalid("carrier.api_base", "cannot be empty"));
        }

        if self.request_timeout_secs == 0 {
            return Err(TunnelError::config_invalid(
                "carrier.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for CarrierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierConfig")
            .field("api_base", &self.api_base)
            .field("user_token", &self.user_token.as_ref().map(|_| REDACTED))
            .field("app_token", &self.app_token.as_ref().map(|_| REDACTED))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_token: None,
            app_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TunnelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interface.name, "enp0s8");
        assert_eq!(config.interface.ether_type, 0x0800);
        assert_eq!(config.labels.track.as_str(), "#2_4_4_0_24");
        assert_eq!(config.labels.destination.as_str(), "#2_4_4_0_24");
        assert_eq!(config.pacing(), Pacing::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r##"
[interface]
name = "eth1"

[labels]
track = "#inbound"
destination = "#outbound"

[codec]
reserved_char = "+"

[pacing]
publish_interval_ms = 500
publish_failure_ms = 5000
"##;

        let config = TunnelConfig::from_str(toml).unwrap();
        assert_eq!(config.interface.name, "eth1");
        assert_eq!(config.labels.track.as_str(), "#inbound");
        assert_eq!(config.labels.destination.as_str(), "#outbound");
        assert_eq!(config.codec.reserved_char, '+');
        assert_eq!(config.codec.max_post_len, 280);
        assert_eq!(config.pacing().publish_interval, Duration::from_millis(500));
        assert_eq!(config.pacing().read_retry, Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_config() {
        let cases = [
            ("[interface]\nname = \"\"", "interface.name"),
            ("[interface]\nname = \"an_interface_name_too_long\"", "interface.name"),
            ("[codec]\nmin_packet_len = 8", "codec.min_packet_len"),
            ("[pacing]\nread_retry_ms = 0", "pacing.read_retry_ms"),
            ("[pacing]\npublish_failure_ms = 1000", "pacing.publish_failure_ms"),
            ("[carrier]\nrequest_timeout_secs = 0", "carrier.request_timeout_secs"),
            ("[codec]\nmax_post_len = 8", "labels.destination"),
        ];

        for (toml, field) in cases {
            match TunnelConfig::from_str(toml) {
                Err(TunnelError::ConfigInvalid { field: f, .. }) => assert_eq!(f, field, "{toml}"),
                other => panic!("expected ConfigInvalid for {toml}, got {other:?}"),
            }
        }

        let empty_label = TunnelConfig::from_str("[labels]\ntrack = \"\"");
        assert!(matches!(empty_label, Err(TunnelError::ConfigLoad { .. })));
    }

    #[test]
    fn test_env_fills_missing_tokens_only() {
        let mut config =
            TunnelConfig::from_str("[carrier]\nuser_token = \"from-file\"\napp_token = \"\"").unwrap();

        config.apply_env_with(|name| match name {
            ENV_USER_TOKEN => Some("from-env-user".into()),
            ENV_APP_TOKEN => Some("from-env-app".into()),
            _ => None,
        });

        assert_eq!(config.carrier.user_token.as_deref(), Some("from-file"));
        assert_eq!(config.carrier.app_token.as_deref(), Some("from-env-app"));
    }

    #[test]
    fn test_carrier_settings_require_tokens() {
        let mut config = TunnelConfig::default();
        match config.carrier_settings() {
            Err(TunnelError::ConfigMissing { field }) => assert_eq!(field, "carrier.user_token"),
            other => panic!("unexpected: {other:?}"),
        }

        config.carrier.user_token = Some("u".into());
        config.carrier.app_token = Some("a".into());
        let settings = config.carrier_settings().unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.app_token.as_deref(), Some("a"));
    }

    #[test]
    fn test_overrides() {
        let mut config = TunnelConfig::default();
        config
            .apply_overrides(Some("eth2".into()), Some("#a".into()), None)
            .unwrap();
        assert_eq!(config.interface.name, "eth2");
        assert_eq!(config.labels.track.as_str(), "#a");
        assert_eq!(config.labels.destination.as_str(), "#2_4_4_0_24");

        assert!(config.apply_overrides(None, None, Some(String::new())).is_err());
    }

    #[test]
    fn test_redacted_output() {
        let mut config = TunnelConfig::default();
        config.carrier.user_token = Some("secret-user".into());
        config.carrier.app_token = Some("secret-app".into());

        let text = config.to_toml_redacted();
        assert!(!text.contains("secret"));
        assert!(text.contains(REDACTED));
        assert!(!format!("{config:?}").contains("secret"));

        let reparsed = TunnelConfig::from_str(&text).unwrap();
        assert_eq!(reparsed.labels.track, config.labels.track);
    }

    #[test]
    fn test_codec_follows_config() {
        let config = TunnelConfig::from_str("[codec]\nmin_packet_len = 40\nmax_post_len = 140").unwrap();
        let codec = config.codec();
        assert_eq!(codec.min_packet_len(), 40);
        assert_eq!(codec.max_post_len(), 140);
    }
}
