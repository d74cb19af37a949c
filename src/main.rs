//! Aegis Live - esports telemetry enrichment server
//!
//! # Usage
//!
//! ```bash
//! # Synthetic squad, built-in defaults
//! cargo run --release
//!
//! # Replay recorded snapshots from ./replays/<series_id>.json
//! ./aegis-live --source replay --replay-dir ./replays
//!
//! # Upstream HTTP feed
//! AEGIS_FEED_API_KEY=... ./aegis-live --source http --base-url https://feed.example.com
//!
//! # Enable the sequence model slot
//! cargo run --release --features sequence-model
//! ```
//!
//! # Environment Variables
//!
//! - `AEGIS_CONFIG`: path to a TOML config file
//! - `AEGIS_SERVER_ADDR`: bind address override
//! - `AEGIS_FEED_API_KEY`: bearer token for the http source
//! - `AEGIS_LOG_FORMAT`: set to `json` for structured log lines
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use aegis_live::api::{create_app, ApiState};
use aegis_live::config::{AegisConfig, SourceKind};
use aegis_live::models::ModelRegistry;
use aegis_live::pipeline::{source, AppContext, HeuristicPredictionService};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aegis-live")]
#[command(about = "Aegis Live esports telemetry enrichment server")]
#[command(version)]
struct CliArgs {
    /// HTTP bind address (overrides server.addr)
    #[arg(long, env = "AEGIS_SERVER_ADDR")]
    addr: Option<String>,

    /// Config file path (overrides the $AEGIS_CONFIG / ./aegis_config.toml search)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Telemetry source
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Directory of recorded snapshots for the replay source
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// Base URL of the upstream feed for the http source
    #[arg(long)]
    base_url: Option<String>,

    /// Directory holding the model artifacts
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

impl CliArgs {
    fn apply(self, config: &mut AegisConfig) {
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(dir) = self.replay_dir {
            config.source.replay_dir = Some(dir);
        }
        if let Some(url) = self.base_url {
            config.source.base_url = Some(url);
        }
        if let Some(dir) = self.model_dir {
            config.models.model_dir = dir;
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("AEGIS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let args = CliArgs::parse();

    let mut config = match args.config {
        Some(ref path) => AegisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AegisConfig::load(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Aegis Live - Esports Telemetry Enrichment");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let registry = ModelRegistry::load(&config.models);
    if registry.available_count() == 0 {
        warn!("🧠 No model artifacts loaded, every metric will use fallback estimates");
    } else {
        info!(
            "🧠 Models: {}/{} slots available",
            registry.available_count(),
            aegis_live::ModelSlot::ALL.len()
        );
    }

    let telemetry_source = source::from_config(&config.source).context("Failed to build telemetry source")?;
    info!("📥 Input: {} source", telemetry_source.source_name());

    let server_addr = config.server.addr.clone();
    let ctx = AppContext::new(
        config,
        registry,
        Arc::from(telemetry_source),
        Arc::new(HeuristicPredictionService::new()),
    );

    // Graceful shutdown via Ctrl+C; also stops every live stream.
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let app = create_app(ApiState::new(ctx, cancel_token.clone()));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("🌐 Listening on http://{}", server_addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => {
            info!("[HttpServer] Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("[HttpServer] Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}
