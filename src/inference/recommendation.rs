//! Template-based coaching recommendation.
//!
//! Picks the dominant deviation among the percentage metrics (the one furthest
//! below the middle of its reference band) and fills a sentence template with
//! the actual values. When every metric sits above its band midpoint, the
//! strongest one is called out instead.

use super::fallback::RealMetric;
use crate::types::{format_tempo, ProbabilityMetrics, SquadMetric};

pub fn recommend(metrics: &ProbabilityMetrics, squad: &[SquadMetric]) -> String {
    let scored = [
        (RealMetric::SiteRetake, metrics.site_retake_success),
        (RealMetric::ObjectiveContest, metrics.baron_contest_rate),
        (RealMetric::Clutch, metrics.clutch_potential),
    ]
    .map(|(m, v)| (m, v, m.normalized(v)));

    let weakest = scored
        .iter()
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .copied();
    let strongest = scored
        .iter()
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .copied();

    let (Some((metric, value, score)), Some((best, best_value, _))) = (weakest, strongest) else {
        return String::new();
    };

    if score >= 0.0 {
        return format!(
            "All indicators above baseline ({} leads at {best_value:.1}%). Hold current tempo ({}).",
            label(best),
            format_tempo(metrics.tempo_deviation)
        );
    }

    let focus = support_clause(squad);
    match metric {
        RealMetric::SiteRetake => format!(
            "Site retake success is down at {value:.1}%. Stack utility before re-entry{focus}."
        ),
        RealMetric::ObjectiveContest => format!(
            "Objective contest rate sits at {value:.1}%. Group earlier for neutral objective setups{focus}."
        ),
        _ => format!(
            "Clutch potential is only {value:.1}%. Review late-round 1vX decision making{focus}."
        ),
    }
}

fn label(metric: RealMetric) -> &'static str {
    match metric {
        RealMetric::SiteRetake => "site retake",
        RealMetric::ObjectiveContest => "objective contest",
        RealMetric::Clutch => "clutch potential",
        RealMetric::Tempo => "tempo",
    }
}

/// " and route resources to X (-120 gold)" for the furthest-behind player.
fn support_clause(squad: &[SquadMetric]) -> String {
    squad
        .iter()
        .min_by_key(|p| p.gold_diff)
        .map(|p| format!(" and route resources to {} ({:+} gold)", p.name, p.gold_diff))
        .unwrap_or_default()
}
