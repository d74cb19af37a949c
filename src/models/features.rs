//! Model input schema.
//!
//! Every artifact is trained against the same fixed-order per-player feature
//! vector. Missing stats read as zero.

use crate::types::PlayerRecord;

/// Stat keys in feature order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "kills",
    "deaths",
    "assists",
    "gold",
    "creep_score",
    "vision",
    "damage",
    "level",
];

pub const NUM_FEATURES: usize = 8;

pub type FeatureVector = [f64; NUM_FEATURES];

/// Feature vector for one player.
pub fn player_features(player: &PlayerRecord) -> FeatureVector {
    let mut out = [0.0; NUM_FEATURES];
    for (slot, name) in out.iter_mut().zip(FEATURE_NAMES) {
        *slot = player.stat(name);
    }
    out
}

/// Column mean over a sequence. Empty input yields zeros.
pub fn mean_features(rows: &[FeatureVector]) -> FeatureVector {
    let mut out = [0.0; NUM_FEATURES];
    if rows.is_empty() {
        return out;
    }
    for row in rows {
        for (acc, v) in out.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = rows.len() as f64;
    out.iter_mut().for_each(|v| *v /= n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_player_features_order_and_defaults() {
        let mut stats = BTreeMap::new();
        stats.insert("kills".to_string(), 3.0);
        stats.insert("level".to_string(), 11.0);
        stats.insert("unrelated".to_string(), 99.0);
        let player = PlayerRecord {
            name: "Jojopyun".to_string(),
            stats,
        };
        let f = player_features(&player);
        assert_eq!(f[0], 3.0);
        assert_eq!(f[7], 11.0);
        assert_eq!(f[1..7], [0.0; 6]);
    }

    #[test]
    fn test_mean_features() {
        let mut a = [0.0; NUM_FEATURES];
        let mut b = [0.0; NUM_FEATURES];
        a[2] = 2.0;
        b[2] = 6.0;
        assert_eq!(mean_features(&[a, b])[2], 4.0);
        assert_eq!(mean_features(&[]), [0.0; NUM_FEATURES]);
    }
}
