//! Telemetry source abstraction.
//!
//! A [`TelemetrySource`] maps a series identifier to one raw snapshot. Three
//! implementations ship with the crate:
//! - [`SyntheticSource`]: random five-player squad (demo / development)
//! - [`ReplaySource`]: recorded snapshots from `<dir>/<series_id>.json`
//! - [`HttpSource`]: an upstream HTTP feed

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::defaults::{SOURCE_API_KEY_ENV, SOURCE_HTTP_TIMEOUT_SECS};
use crate::config::{SourceConfig, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("I/O error reading {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown series '{0}'")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

/// Where snapshots come from.
///
/// Implementations must be cheap to call once per second and must not block
/// the runtime.
#[async_trait]
pub trait TelemetrySource: Send + Sync + 'static {
    /// Fetch the latest snapshot for `series_id` as raw JSON.
    async fn fetch(&self, series_id: &str) -> Result<Value, SourceError>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

/// Build the source selected by configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn TelemetrySource>, SourceError> {
    let source: Box<dyn TelemetrySource> = match config.kind {
        SourceKind::Synthetic => Box::new(SyntheticSource::new()),
        SourceKind::Replay => {
            let dir = config
                .replay_dir
                .clone()
                .ok_or_else(|| SourceError::Other("replay source needs source.replay_dir".to_string()))?;
            Box::new(ReplaySource::new(dir))
        }
        SourceKind::Http => {
            let base_url = config
                .base_url
                .clone()
                .ok_or_else(|| SourceError::Other("http source needs source.base_url".to_string()))?;
            let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(SOURCE_HTTP_TIMEOUT_SECS));
            Box::new(HttpSource::new(&base_url, std::env::var(SOURCE_API_KEY_ENV).ok(), timeout)?)
        }
    };
    Ok(source)
}

// ============================================================================
// Synthetic Source
// ============================================================================

/// Generates a plausible five-player snapshot on every call.
pub struct SyntheticSource {
    roster: Vec<(&'static str, &'static str)>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            roster: vec![
                ("Zven", "ADC"),
                ("Blaber", "Jungle"),
                ("Jojopyun", "Mid"),
                ("Berserker", "Top"),
                ("Vulcan", "Support"),
            ],
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySource for SyntheticSource {
    async fn fetch(&self, series_id: &str) -> Result<Value, SourceError> {
        let mut rng = rand::thread_rng();
        let players: Vec<Value> = self
            .roster
            .iter()
            .map(|(name, role)| {
                json!({
                    "name": name,
                    "role": role,
                    "stats": {
                        "kills": rng.gen_range(0..12),
                        "deaths": rng.gen_range(0..8),
                        "assists": rng.gen_range(0..15),
                        "gold": rng.gen_range(4_000..14_000),
                        "creep_score": rng.gen_range(20..320),
                        "vision": rng.gen_range(5..60),
                        "damage": rng.gen_range(2_000..30_000),
                        "level": rng.gen_range(6..18),
                    }
                })
            })
            .collect();

        Ok(json!({
            "series_id": series_id,
            "source": "synthetic",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "players": players,
        }))
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }
}

// ============================================================================
// Replay Source
// ============================================================================

/// Reads `<dir>/<series_id>.json` on every call.
pub struct ReplaySource {
    dir: PathBuf,
}

impl ReplaySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, series_id: &str) -> Result<PathBuf, SourceError> {
        let valid = !series_id.is_empty()
            && series_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SourceError::NotFound(series_id.to_string()));
        }
        Ok(self.dir.join(format!("{series_id}.json")))
    }
}

#[async_trait]
impl TelemetrySource for ReplaySource {
    async fn fetch(&self, series_id: &str) -> Result<Value, SourceError> {
        let path = self.path_for(series_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(series_id.to_string()))
            }
            Err(e) => return Err(SourceError::Io(path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// HTTP Source
// ============================================================================

/// `GET {base_url}/series/{series_id}` with an optional bearer token.
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TelemetrySource for HttpSource {
    async fn fetch(&self, series_id: &str) -> Result<Value, SourceError> {
        let mut req = self.http.get(format!("{}/series/{}", self.base_url, series_id));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        match resp.status() {
            s if s.is_success() => Ok(resp.json::<Value>().await?),
            reqwest::StatusCode::NOT_FOUND => Err(SourceError::NotFound(series_id.to_string())),
            s => Err(SourceError::Status(s)),
        }
    }

    fn source_name(&self) -> &str {
        "http"
    }
}
