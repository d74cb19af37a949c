//! Aegis Configuration - stream, anomaly, model and source settings as TOML
//!
//! Each struct implements `Default` with the values from [`super::defaults`],
//! so a missing or empty config file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an Aegis deployment.
///
/// Load with `AegisConfig::load()` which searches:
/// 1. `$AEGIS_CONFIG` env var
/// 2. `./aegis_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AegisConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact locations
    #[serde(default)]
    pub models: ModelsConfig,

    /// Streaming cadence
    #[serde(default)]
    pub stream: StreamConfig,

    /// Anomaly detection thresholds
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Upstream telemetry source
    #[serde(default)]
    pub source: SourceConfig,
}

impl AegisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$AEGIS_CONFIG` environment variable
    /// 2. `./aegis_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("AEGIS_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from AEGIS_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from AEGIS_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "AEGIS_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("aegis_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./aegis_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./aegis_config.toml, using defaults");
                }
            }
        }

        info!("No aegis_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings and otherwise ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate internal consistency.
    ///
    /// Rules:
    /// - Probability thresholds lie in [0, 1] and micro < macro
    /// - Stream interval is non-zero
    /// - Replay and HTTP sources name their location
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let a = &self.anomaly;

        for (name, value) in [
            ("anomaly.micro_threshold", a.micro_threshold),
            ("anomaly.macro_threshold", a.macro_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if a.micro_threshold >= a.macro_threshold {
            errors.push(format!(
                "anomaly.micro_threshold ({}) must be below anomaly.macro_threshold ({})",
                a.micro_threshold, a.macro_threshold
            ));
        }

        if self.stream.interval_ms == 0 {
            errors.push("stream.interval_ms must be greater than 0".to_string());
        }
        if self.stream.default_series_id.trim().is_empty() {
            errors.push("stream.default_series_id must not be empty".to_string());
        }

        match self.source.kind {
            SourceKind::Replay if self.source.replay_dir.is_none() => {
                errors.push("source.replay_dir is required when source.kind = \"replay\"".to_string());
            }
            SourceKind::Http if self.source.base_url.is_none() => {
                errors.push("source.base_url is required when source.kind = \"http\"".to_string());
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `AEGIS_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: default_cors_origins(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the model artifacts.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_tree_ensemble_file")]
    pub tree_ensemble_file: String,

    #[serde(default = "default_gradient_boosted_file")]
    pub gradient_boosted_file: String,

    #[serde(default = "default_sequence_file")]
    pub sequence_file: String,

    /// Config-time switch for the sequence slot. The slot also needs the
    /// `sequence-model` build feature.
    #[serde(default = "default_true")]
    pub sequence_enabled: bool,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_MODEL_DIR)
}

fn default_tree_ensemble_file() -> String {
    defaults::TREE_ENSEMBLE_FILE.to_string()
}

fn default_gradient_boosted_file() -> String {
    defaults::GRADIENT_BOOSTED_FILE.to_string()
}

fn default_sequence_file() -> String {
    defaults::SEQUENCE_FILE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            tree_ensemble_file: default_tree_ensemble_file(),
            gradient_boosted_file: default_gradient_boosted_file(),
            sequence_file: default_sequence_file(),
            sequence_enabled: true,
        }
    }
}

// ============================================================================
// Stream
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Emission cadence in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Series used when a request omits `series_id`.
    #[serde(default = "default_series_id")]
    pub default_series_id: String,
}

fn default_interval_ms() -> u64 {
    defaults::STREAM_INTERVAL_MS
}

fn default_series_id() -> String {
    defaults::DEFAULT_SERIES_ID.to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            default_series_id: default_series_id(),
        }
    }
}

// ============================================================================
// Anomaly
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Assist-impact probability below which a micro anomaly fires.
    #[serde(default = "default_micro_threshold")]
    pub micro_threshold: f64,

    /// Assist-impact probability above which a macro anomaly fires.
    #[serde(default = "default_macro_threshold")]
    pub macro_threshold: f64,

    /// Record macro anomalies in the session as well as micro ones.
    #[serde(default = "default_true")]
    pub detect_macro: bool,
}

fn default_micro_threshold() -> f64 {
    defaults::MICRO_ANOMALY_THRESHOLD
}

fn default_macro_threshold() -> f64 {
    defaults::MACRO_ANOMALY_THRESHOLD
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            micro_threshold: default_micro_threshold(),
            macro_threshold: default_macro_threshold(),
            detect_macro: true,
        }
    }
}

// ============================================================================
// Source
// ============================================================================

/// Where telemetry snapshots come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Randomly generated five-player squad.
    #[default]
    Synthetic,
    /// `<replay_dir>/<series_id>.json` files.
    Replay,
    /// Upstream HTTP feed.
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Directory of recorded snapshots (replay source).
    #[serde(default)]
    pub replay_dir: Option<PathBuf>,

    /// Base URL of the upstream feed (http source).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout for the http source. Defaults to
    /// [`defaults::SOURCE_HTTP_TIMEOUT_SECS`].
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AegisConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: AegisConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.stream.interval_ms, 1_000);
        assert_eq!(config.stream.default_series_id, "2616372");
        assert_eq!(config.anomaly.micro_threshold, 0.3);
        assert_eq!(config.anomaly.macro_threshold, 0.8);
        assert_eq!(config.source.kind, SourceKind::Synthetic);
        assert!(config.models.sequence_enabled);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[stream]
default_series_id = "777"

[anomaly]
micro_threshold = 0.25
"#;
        let config = AegisConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.stream.default_series_id, "777");
        assert_eq!(config.anomaly.micro_threshold, 0.25);
        // Non-overridden values retain defaults
        assert_eq!(config.stream.interval_ms, 1_000);
        assert_eq!(config.anomaly.macro_threshold, 0.8);
    }

    #[test]
    fn test_validation_catches_inverted_thresholds() {
        let mut config = AegisConfig::default();
        config.anomaly.micro_threshold = 0.9;
        config.anomaly.macro_threshold = 0.5;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("micro_threshold")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_requires_replay_dir() {
        let mut config = AegisConfig::default();
        config.source.kind = SourceKind::Replay;
        assert!(config.validate().is_err());
        config.source.replay_dir = Some(PathBuf::from("/tmp/replays"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = AegisConfig::default();
        config.stream.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("aegis_config.toml");
        std::fs::write(&path, "[server]\naddr = \"127.0.0.1:9000\"\n").expect("write");

        let config = AegisConfig::load_from_file(&path).expect("load");
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.server.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_toml_round_trip_keeps_source_kind() {
        let mut config = AegisConfig::default();
        config.source.kind = SourceKind::Http;
        config.source.base_url = Some("http://feed.local".to_string());
        let text = config.to_toml().expect("serialize");
        let parsed = AegisConfig::from_toml_str(&text).expect("parse");
        assert_eq!(parsed.source.kind, SourceKind::Http);
    }
}
