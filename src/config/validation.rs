//! Unknown-key detection for `aegis_config.toml`.
//!
//! The raw TOML is walked as a `toml::Value` tree before serde sees it, and
//! every dotted key that [`AegisConfig`](super::AegisConfig) does not know is
//! reported with a "did you mean?" suggestion. Warnings never reject a file.

use std::collections::BTreeSet;

/// A non-fatal config warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub key: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown config key '{}'", self.key)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every dotted key path `AegisConfig` accepts.
///
/// Kept by hand next to the struct hierarchy in `aegis_config.rs`.
const KNOWN_KEYS: &[&str] = &[
    "server",
    "server.addr",
    "server.cors_origins",
    "models",
    "models.model_dir",
    "models.tree_ensemble_file",
    "models.gradient_boosted_file",
    "models.sequence_file",
    "models.sequence_enabled",
    "stream",
    "stream.interval_ms",
    "stream.default_series_id",
    "anomaly",
    "anomaly.micro_threshold",
    "anomaly.macro_threshold",
    "anomaly.detect_macro",
    "source",
    "source.kind",
    "source.replay_dir",
    "source.base_url",
    "source.timeout_secs",
];

/// Collect every dotted key path in a TOML tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };

    let mut keys = Vec::with_capacity(table.len());
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            keys.extend(walk_toml_keys(v, &path));
        }
        keys.push(path);
    }
    keys
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = (above + 1)
                .min(row[j] + 1)
                .min(diag + usize::from(ca != cb));
            diag = above;
        }
    }
    row[b.len()]
}

/// Closest known key within edit distance 3.
pub fn suggest_correction(unknown: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .map(|k| (*k, edit_distance(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| k.to_string())
}

/// Parse a raw TOML string and return a warning per unknown key.
///
/// Parse errors yield no warnings; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known: BTreeSet<&str> = KNOWN_KEYS.iter().copied().collect();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key),
            key,
        })
        .collect()
}
