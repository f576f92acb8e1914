//! Summarizes all of a learner's topic rows into one classification with
//! derived preferences, and adapts the stored skill level after a session.

use serde::{Deserialize, Serialize};

use crate::selection::aggregate::UnifiedTopicMastery;
use crate::types::{BloomLevel, StudentType};

const STRUGGLER_CEILING: f64 = 40.0;
const INTERMEDIATE_CEILING: f64 = 70.0;
/// Rows without flow evidence contribute this neutral score to the mean.
const NEUTRAL_FLOW: f64 = 50.0;
/// Session accuracy and flow needed to earn a skill bump.
const PROMOTION_ACCURACY: f64 = 0.9;
const PROMOTION_FLOW: f64 = 70.0;
const DEMOTION_ACCURACY: f64 = 0.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    /// Stored skill level, 1-10.
    pub skill_level: u8,
    pub student_type: StudentType,
    pub overall_mastery: f64,
    pub average_accuracy: f64,
    pub average_flow_score: f64,
    pub preferred_bloom_level: BloomLevel,
    /// 0-1 appetite for above-skill challenges.
    pub challenge_tolerance: f64,
    pub optimal_session_minutes: u32,
    pub topics_tracked: usize,
}

/// Aggregates from one completed session, used for skill adaptation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// 0-1 share of correct answers in the session.
    pub accuracy: f64,
    /// 0-100 mean flow score across the session.
    pub average_flow_score: f64,
}

/// Builds the learner profile from all unified rows. With no rows the
/// learner is classified intermediate, the neutral default.
pub fn build(skill_level: u8, rows: &[UnifiedTopicMastery]) -> LearnerProfile {
    let skill_level = skill_level.clamp(1, 10);
    if rows.is_empty() {
        return LearnerProfile {
            skill_level,
            student_type: StudentType::Intermediate,
            overall_mastery: 0.0,
            average_accuracy: 0.0,
            average_flow_score: 0.0,
            preferred_bloom_level: BloomLevel::Remember,
            challenge_tolerance: 0.6,
            optimal_session_minutes: 25,
            topics_tracked: 0,
        };
    }

    let count = rows.len() as f64;
    let overall_mastery = rows.iter().map(|r| r.mastery_level).sum::<f64>() / count;
    let average_accuracy = rows.iter().map(|r| r.accuracy_rate).sum::<f64>() / count;
    let average_flow_score = rows
        .iter()
        .map(|r| r.flow_score.unwrap_or(NEUTRAL_FLOW))
        .sum::<f64>()
        / count;

    let composite =
        overall_mastery * 0.4 + average_accuracy * 100.0 * 0.4 + average_flow_score * 0.2;
    let student_type = classify_composite(composite);
    let (challenge_tolerance, optimal_session_minutes) = preferences_for(student_type);

    LearnerProfile {
        skill_level,
        student_type,
        overall_mastery,
        average_accuracy,
        average_flow_score,
        preferred_bloom_level: preferred_level(rows),
        challenge_tolerance,
        optimal_session_minutes,
        topics_tracked: rows.len(),
    }
}

/// Applies the post-session skill adjustment and returns the stored
/// integer level. Callers tracking fractional skill pass it unrounded.
pub fn adapt_skill_level(current: f64, session: &SessionSummary) -> u8 {
    let level = current.clamp(1.0, 10.0);
    let adjusted = if session.accuracy >= PROMOTION_ACCURACY
        && session.average_flow_score >= PROMOTION_FLOW
    {
        level + 0.5
    } else if session.accuracy < DEMOTION_ACCURACY {
        level - 0.5
    } else {
        level
    };
    adjusted.clamp(1.0, 10.0).round() as u8
}

fn classify_composite(composite: f64) -> StudentType {
    if composite < STRUGGLER_CEILING {
        StudentType::Struggler
    } else if composite < INTERMEDIATE_CEILING {
        StudentType::Intermediate
    } else {
        StudentType::Advanced
    }
}

fn preferences_for(student_type: StudentType) -> (f64, u32) {
    match student_type {
        StudentType::Struggler => (0.3, 15),
        StudentType::Intermediate => (0.6, 25),
        StudentType::Advanced => (0.85, 40),
    }
}

/// Most common current level across rows; ties go to the lower level.
fn preferred_level(rows: &[UnifiedTopicMastery]) -> BloomLevel {
    let mut counts = [0u32; 6];
    for row in rows {
        counts[(row.current_bloom_level.index() - 1) as usize] += 1;
    }
    let mut preferred = BloomLevel::Remember;
    let mut best = 0u32;
    for level in BloomLevel::ALL {
        let count = counts[(level.index() - 1) as usize];
        if count > best {
            best = count;
            preferred = level;
        }
    }
    preferred
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(mastery: f64, accuracy: f64, flow: Option<f64>, level: BloomLevel) -> UnifiedTopicMastery {
        UnifiedTopicMastery {
            subject: "Math".to_string(),
            topic: format!("topic-{mastery}"),
            mastery_level: mastery,
            accuracy_rate: accuracy,
            last_practiced: None,
            concept_gaps: Vec::new(),
            total_attempts: 3,
            current_bloom_level: level,
            next_target_level: level.next(),
            review_bloom_level: None,
            flow_score: flow,
            weak_area: false,
            spaced_repetition_due: false,
            optimal_interval_days: 1,
            days_since_practice: None,
        }
    }

    #[test]
    fn no_rows_defaults_to_intermediate() {
        let profile = build(5, &[]);
        assert_eq!(profile.student_type, StudentType::Intermediate);
        assert_eq!(profile.overall_mastery, 0.0);
        assert_eq!(profile.preferred_bloom_level, BloomLevel::Remember);
        assert_eq!(profile.topics_tracked, 0);
    }

    #[test]
    fn composite_thresholds_split_the_student_types() {
        // mastery 20, accuracy 0.2, flow 30 -> 8 + 8 + 6 = 22.
        let struggling = build(5, &[row(20.0, 0.2, Some(30.0), BloomLevel::Remember)]);
        assert_eq!(struggling.student_type, StudentType::Struggler);

        // mastery 50, accuracy 0.5, flow 60 -> 20 + 20 + 12 = 52.
        let middle = build(5, &[row(50.0, 0.5, Some(60.0), BloomLevel::Understand)]);
        assert_eq!(middle.student_type, StudentType::Intermediate);

        // mastery 80, accuracy 0.9, flow 80 -> 32 + 36 + 16 = 84.
        let advanced = build(5, &[row(80.0, 0.9, Some(80.0), BloomLevel::Apply)]);
        assert_eq!(advanced.student_type, StudentType::Advanced);
    }

    #[test]
    fn missing_flow_evidence_counts_as_neutral() {
        let profile = build(5, &[row(60.0, 0.8, None, BloomLevel::Understand)]);
        assert_eq!(profile.average_flow_score, NEUTRAL_FLOW);
    }

    #[test]
    fn preferences_follow_the_classification() {
        let struggling = build(5, &[row(10.0, 0.1, Some(20.0), BloomLevel::Remember)]);
        assert_eq!(struggling.challenge_tolerance, 0.3);
        assert_eq!(struggling.optimal_session_minutes, 15);

        let advanced = build(5, &[row(90.0, 0.95, Some(85.0), BloomLevel::Evaluate)]);
        assert_eq!(advanced.challenge_tolerance, 0.85);
        assert_eq!(advanced.optimal_session_minutes, 40);
    }

    #[test]
    fn preferred_level_is_the_mode_with_low_tie_break() {
        let rows = vec![
            row(60.0, 0.8, None, BloomLevel::Understand),
            row(61.0, 0.8, None, BloomLevel::Understand),
            row(62.0, 0.8, None, BloomLevel::Apply),
        ];
        assert_eq!(build(5, &rows).preferred_bloom_level, BloomLevel::Understand);

        let tied = vec![
            row(60.0, 0.8, None, BloomLevel::Remember),
            row(61.0, 0.8, None, BloomLevel::Apply),
        ];
        assert_eq!(build(5, &tied).preferred_bloom_level, BloomLevel::Remember);
    }

    #[test]
    fn strong_sessions_raise_the_skill_level() {
        let session = SessionSummary {
            accuracy: 0.95,
            average_flow_score: 80.0,
        };
        assert_eq!(adapt_skill_level(5.0, &session), 6, "5.5 rounds up for storage");
        assert_eq!(adapt_skill_level(10.0, &session), 10, "clamped at the top");
    }

    #[test]
    fn poor_sessions_lower_fractional_skill() {
        let session = SessionSummary {
            accuracy: 0.3,
            average_flow_score: 50.0,
        };
        assert_eq!(adapt_skill_level(4.6, &session), 4);
        assert_eq!(adapt_skill_level(1.0, &session), 1, "clamped at the bottom");
    }

    #[test]
    fn middling_sessions_leave_skill_unchanged() {
        let session = SessionSummary {
            accuracy: 0.7,
            average_flow_score: 60.0,
        };
        assert_eq!(adapt_skill_level(5.0, &session), 5);
    }

    #[test]
    fn promotion_needs_both_accuracy_and_flow() {
        let accurate_but_flat = SessionSummary {
            accuracy: 0.95,
            average_flow_score: 40.0,
        };
        assert_eq!(adapt_skill_level(5.0, &accurate_but_flat), 5);
    }
}
