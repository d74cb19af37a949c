//! Config Validation Tests
//!
//! Typo detection and consistency checks on `aegis_config.toml`, exercised
//! independently from the rest of the pipeline.

use aegis_live::config::validation::validate_unknown_keys;
use aegis_live::config::{AegisConfig, ConfigError, SourceKind};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_anomaly_threshold_warns_with_suggestion() {
    let toml_str = r#"
[anomaly]
micro_treshold = 0.25
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].key.contains("micro_treshold"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("anomaly.micro_threshold"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[server]
addr = "127.0.0.1:9000"
cors_origins = ["https://coach.example.com"]

[models]
model_dir = "/opt/aegis/models"
sequence_enabled = false

[stream]
interval_ms = 500
default_series_id = "2616372"

[anomaly]
micro_threshold = 0.25
macro_threshold = 0.85
detect_macro = false

[source]
kind = "replay"
replay_dir = "./replays"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {:?}", warnings);

    let config = AegisConfig::from_toml_str(toml_str).expect("valid config");
    assert_eq!(config.stream.interval_ms, 500);
    assert_eq!(config.source.kind, SourceKind::Replay);
    assert!(!config.anomaly.detect_macro);
    assert!(!config.models.sequence_enabled);
}

#[test]
fn unknown_keys_do_not_fail_loading() {
    let config = AegisConfig::from_toml_str(
        r#"
[stream]
intervl_ms = 250
"#,
    )
    .expect("unknown keys only warn");
    assert_eq!(config.stream.interval_ms, 1_000);
}

// ============================================================================
// Consistency Validation
// ============================================================================

#[test]
fn out_of_range_threshold_rejected() {
    let err = AegisConfig::from_toml_str(
        r#"
[anomaly]
macro_threshold = 1.5
"#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("anomaly.macro_threshold")))
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn http_source_without_base_url_rejected() {
    let err = AegisConfig::from_toml_str(
        r#"
[source]
kind = "http"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = AegisConfig::from_toml_str("[stream\ninterval_ms = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
}
