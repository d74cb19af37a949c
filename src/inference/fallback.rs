//! Bounded fallback estimates.
//!
//! When a model slot is absent the engine substitutes a uniform draw from a
//! fixed range, so the output shape never changes. Ranges are inclusive and
//! live in [`crate::config::defaults`].

use rand::Rng;

use crate::config::defaults::{
    FALLBACK_CLUTCH_RANGE, FALLBACK_CONTEST_RANGE, FALLBACK_CS_RANGE, FALLBACK_GOLD_DIFF_RANGE,
    FALLBACK_RETAKE_RANGE, FALLBACK_TEMPO_RANGE, FALLBACK_VISION_RANGE,
};

/// Integer-valued squad metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntMetric {
    CreepScore,
    GoldDiff,
    Vision,
}

impl IntMetric {
    pub fn range(self) -> (i64, i64) {
        match self {
            IntMetric::CreepScore => FALLBACK_CS_RANGE,
            IntMetric::GoldDiff => FALLBACK_GOLD_DIFF_RANGE,
            IntMetric::Vision => FALLBACK_VISION_RANGE,
        }
    }

    pub fn sample<R: Rng>(self, rng: &mut R) -> i64 {
        let (lo, hi) = self.range();
        rng.gen_range(lo..=hi)
    }
}

/// Real-valued team metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealMetric {
    SiteRetake,
    ObjectiveContest,
    Clutch,
    Tempo,
}

impl RealMetric {
    pub fn range(self) -> (f64, f64) {
        match self {
            RealMetric::SiteRetake => FALLBACK_RETAKE_RANGE,
            RealMetric::ObjectiveContest => FALLBACK_CONTEST_RANGE,
            RealMetric::Clutch => FALLBACK_CLUTCH_RANGE,
            RealMetric::Tempo => FALLBACK_TEMPO_RANGE,
        }
    }

    /// Uniform draw rounded to one decimal. Rounding cannot leave the range
    /// because both bounds are whole numbers.
    pub fn sample<R: Rng>(self, rng: &mut R) -> f64 {
        let (lo, hi) = self.range();
        round1(rng.gen_range(lo..=hi))
    }

    /// Position relative to the middle of the range: -1 at the low end,
    /// +1 at the high end.
    pub fn normalized(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        let mid = (lo + hi) / 2.0;
        (value - mid) / ((hi - lo) / 2.0)
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
