//! Drill recommendation rules.

use std::collections::BTreeMap;

use crate::config::defaults::MICRO_DRILL_THRESHOLD;
use crate::types::AnomalyKind;

pub const CROSSHAIR_DRILL: &str =
    "Crosshair Placement Efficiency: 15 min pre-aim routine on common angles, focus on first-bullet accuracy";
pub const MOVEMENT_DRILL: &str =
    "Movement Discipline: 10 min counter-strafe and spacing drill, hold positions until utility is spent";
pub const ROTATION_DRILL: &str =
    "Macro Rotation Timing: review objective spawn timers and rehearse early rotations as a five";

/// Ordered drill list for a set of anomaly counts. Always at least two.
pub fn select_drills(counts: &BTreeMap<AnomalyKind, usize>) -> Vec<String> {
    let micro = counts.get(&AnomalyKind::Micro).copied().unwrap_or(0);
    let first = if micro > MICRO_DRILL_THRESHOLD {
        CROSSHAIR_DRILL
    } else {
        MOVEMENT_DRILL
    };
    vec![first.to_string(), ROTATION_DRILL.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(micro: usize, macro_: usize) -> BTreeMap<AnomalyKind, usize> {
        BTreeMap::from([(AnomalyKind::Micro, micro), (AnomalyKind::Macro, macro_)])
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(select_drills(&counts(3, 0))[0], MOVEMENT_DRILL);
        assert_eq!(select_drills(&counts(4, 0))[0], CROSSHAIR_DRILL);
    }

    #[test]
    fn test_macro_anomalies_do_not_trigger_aim_drill() {
        assert_eq!(select_drills(&counts(0, 10))[0], MOVEMENT_DRILL);
    }

    #[test]
    fn test_rotation_drill_always_second() {
        for n in 0..8 {
            let drills = select_drills(&counts(n, 0));
            assert_eq!(drills.len(), 2);
            assert_eq!(drills[1], ROTATION_DRILL);
        }
        assert_eq!(select_drills(&BTreeMap::new()).len(), 2);
    }
}
