// ============================================
// File: crates/avian-tunnel/src/main.rs
// ============================================
//! # Avian Tunnel Entry Point
//!
//! ## Creation Reason
//! Binary entry point: CLI parsing, logging setup, configuration loading
//! and tunnel execution.
//!
//! ## Usage
//! ```bash
//! # Run with defaults (enp0s8, label #2_4_4_0_24)
//! AVIAN_USER_TOKEN=... AVIAN_APP_TOKEN=... avian-tunnel start
//!
//! # Point-to-point: each end tracks what the other publishes
//! avian-tunnel start --ifname eth1 --track-label '#to_a' --destination-label '#to_b'
//!
//! # Print the effective configuration
//! avian-tunnel validate -c /etc/avian/tunnel.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Needs root or CAP_NET_RAW
//! - `RUST_LOG` overrides `logging.level`
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use avian_tunnel::{Tunnel, TunnelConfig, TunnelError};

/// Default configuration path.
const DEFAULT_CONFIG: &str = "/etc/avian/tunnel.toml";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

// ============================================
// CLI Definition
// ============================================

/// Tunnels IPv4 packets through a public message relay
#[derive(Parser, Debug)]
#[command(name = "avian-tunnel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the tunnel
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Capture interface (overrides interface.name)
        #[arg(long)]
        ifname: Option<String>,

        /// Inbound keyword (overrides labels.track)
        #[arg(long)]
        track_label: Option<String>,

        /// Outbound tag (overrides labels.destination)
        #[arg(long)]
        destination_label: Option<String>,
    },

    /// Validate configuration and print the effective values
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = init_logging("info");

    let result = match cli.command {
        Commands::Start {
            config,
            ifname,
            track_label,
            destination_label,
        } => cmd_start(&config, ifname, track_label, destination_label, &filter).await,
        Commands::Validate { config } => cmd_validate(&config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        if e.downcast_ref::<TunnelError>().is_some_and(TunnelError::is_config_error) {
            error!("Check the configuration with `avian-tunnel validate`");
        }
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Starts the tunnel.
async fn cmd_start(
    config_path: &Path,
    ifname: Option<String>,
    track: Option<String>,
    destination: Option<String>,
    filter: &FilterHandle,
) -> anyhow::Result<()> {
    let mut config = load_or_default_config(config_path).await?;
    config.apply_overrides(ifname, track, destination)?;
    config.apply_env();

    set_log_level(filter, &config.logging.level);

    info!("════════════════════════════════════════");
    info!("Interface:    {}", config.interface.name);
    info!("Track:        {}", config.labels.track);
    info!("Destination:  {}", config.labels.destination);
    info!("Carrier:      {}", config.carrier.api_base);
    info!("════════════════════════════════════════");

    let tunnel = Tunnel::new(config);
    let report = tunnel.run().await?;

    info!("Encoder: {}", report.encoder);
    info!("Decoder: {}", report.decoder);
    Ok(())
}

/// Validates the configuration file.
async fn cmd_validate(config_path: &Path) -> anyhow::Result<()> {
    let mut config = load_or_default_config(config_path).await?;
    config.apply_env();

    println!("✅ Configuration is valid");
    println!();
    println!("{}", config.to_toml_redacted());

    if let Err(e) = config.carrier_settings() {
        println!("⚠️  {e}");
        println!("   Set AVIAN_USER_TOKEN / AVIAN_APP_TOKEN before starting.");
    }

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber with a reloadable filter.
fn init_logging(level: &str) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(build_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .ok();

    handle
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Applies the configured level unless `RUST_LOG` is set.
fn set_log_level(handle: &FilterHandle, level: &str) {
    if let Err(e) = handle.reload(build_filter(level)) {
        warn!("Failed to apply log level '{}': {}", level, e);
    }
}

/// Loads config, or returns defaults if the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<TunnelConfig> {
    if path.exists() {
        Ok(TunnelConfig::load(path).await?)
    } else {
        info!("Config file {} not found, using defaults", path.display());
        Ok(TunnelConfig::default())
    }
}
