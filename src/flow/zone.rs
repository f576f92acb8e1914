//! Instantaneous flow classification from the challenge/skill balance.
//!
//! Flow requires the two levels within one point of each other and both at
//! least 3; otherwise the larger side of the imbalance decides the zone.

use serde::{Deserialize, Serialize};

use crate::types::FlowZone;

/// Maximum |challenge - skill| still counted as flow.
const FLOW_BAND: f64 = 1.0;
/// Below this level on either axis the session is too shallow for flow.
const MIN_ENGAGED_LEVEL: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowAssessment {
    pub zone: FlowZone,
    /// 0-100; 100 is a perfect challenge/skill match.
    pub score: f64,
}

/// Classifies one challenge/skill pairing on the 1-10 scales.
pub fn classify(challenge: f64, skill: f64) -> FlowAssessment {
    let imbalance = (challenge - skill).abs();
    if imbalance <= FLOW_BAND && challenge >= MIN_ENGAGED_LEVEL && skill >= MIN_ENGAGED_LEVEL {
        return FlowAssessment {
            zone: FlowZone::Flow,
            score: 100.0 - 10.0 * imbalance,
        };
    }
    if challenge < skill - FLOW_BAND {
        return FlowAssessment {
            zone: FlowZone::Boredom,
            score: (50.0 - 10.0 * (skill - challenge)).max(0.0),
        };
    }
    FlowAssessment {
        zone: FlowZone::Anxiety,
        score: (50.0 - 10.0 * (challenge - skill)).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_levels_are_perfect_flow() {
        let result = classify(5.0, 5.0);
        assert_eq!(result.zone, FlowZone::Flow);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn one_point_imbalance_is_still_flow() {
        let result = classify(6.0, 5.0);
        assert_eq!(result.zone, FlowZone::Flow);
        assert_eq!(result.score, 90.0);
        let result = classify(5.0, 6.0);
        assert_eq!(result.zone, FlowZone::Flow);
        assert_eq!(result.score, 90.0);
    }

    #[test]
    fn low_challenge_against_high_skill_is_boredom() {
        let result = classify(3.0, 8.0);
        assert_eq!(result.zone, FlowZone::Boredom);
        assert_eq!(result.score, 0.0);
        let result = classify(5.0, 7.0);
        assert_eq!(result.zone, FlowZone::Boredom);
        assert_eq!(result.score, 30.0);
    }

    #[test]
    fn high_challenge_against_low_skill_is_anxiety() {
        let result = classify(8.0, 3.0);
        assert_eq!(result.zone, FlowZone::Anxiety);
        assert_eq!(result.score, 0.0);
        let result = classify(7.0, 5.0);
        assert_eq!(result.zone, FlowZone::Anxiety);
        assert_eq!(result.score, 30.0);
    }

    #[test]
    fn shallow_matched_levels_are_not_flow() {
        // Matched but below the engagement floor on both axes.
        let result = classify(2.0, 2.0);
        assert_ne!(result.zone, FlowZone::Flow);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn imbalanced_pairs_mirror_under_swap() {
        let bored = classify(2.0, 8.0);
        let anxious = classify(8.0, 2.0);
        assert_eq!(bored.zone, FlowZone::Boredom);
        assert_eq!(anxious.zone, FlowZone::Anxiety);
        assert_eq!(bored.score, anxious.score);
    }

    #[test]
    fn scores_never_leave_the_0_100_band() {
        for c in 1..=10 {
            for s in 1..=10 {
                let result = classify(f64::from(c), f64::from(s));
                assert!(
                    (0.0..=100.0).contains(&result.score),
                    "score out of range for challenge={c} skill={s}"
                );
            }
        }
    }
}
