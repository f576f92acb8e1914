//! Infers how confident a learner actually was in one answer, without any
//! self-report: six behavioral sub-scores blended into a 1-5 integer.

use crate::config::ConfidenceWeights;
use crate::types::{AttemptSignal, StudentType};

/// Strugglers get a generosity boost to build confidence.
const STRUGGLER_BOOST: f64 = 1.2;
/// Advanced learners are graded slightly stricter.
const ADVANCED_DAMPING: f64 = 0.95;

/// Estimates confidence in {1..5} from one attempt's behavior.
///
/// `previous_accuracy` is the learner's accuracy rate on this topic so far
/// (0 for a first attempt). All sub-scores are tier lookups in [0, 1]; the
/// weighted blend is normalized by the weight total, so non-default weights
/// cannot push the result out of range.
pub fn estimate(
    signal: &AttemptSignal,
    previous_accuracy: f64,
    student_type: StudentType,
    weights: &ConfidenceWeights,
) -> u8 {
    let correctness_score = if signal.is_correct { 1.0 } else { 0.2 };
    let time_score = time_ratio_score(signal.time_ratio());
    let hint_score = hint_score(signal.hints_used);
    let chat_score = chat_score(signal.chat_interactions);
    let history_score = previous_accuracy.clamp(0.0, 1.0);
    let gap_score = difficulty_gap_score(signal.skill_level - signal.difficulty);

    let weighted_sum = weights.correctness * correctness_score
        + weights.time * time_score
        + weights.hints * hint_score
        + weights.chat * chat_score
        + weights.history * history_score
        + weights.difficulty * gap_score;
    let raw = weighted_sum / weights.total().max(1e-6);

    let adjusted = match student_type {
        StudentType::Struggler => (raw * STRUGGLER_BOOST).min(1.0),
        StudentType::Advanced => raw * ADVANCED_DAMPING,
        StudentType::Intermediate => raw,
    };

    let confidence = (adjusted * 4.0 + 1.0).round();
    confidence.clamp(1.0, 5.0) as u8
}

fn time_ratio_score(ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return 0.1;
    }
    if ratio <= 0.5 {
        1.0
    } else if ratio <= 1.0 {
        0.8
    } else if ratio <= 1.5 {
        0.5
    } else if ratio <= 2.0 {
        0.3
    } else {
        0.1
    }
}

fn hint_score(hints: u32) -> f64 {
    match hints {
        0 => 1.0,
        1 => 0.7,
        2 => 0.5,
        3..=4 => 0.3,
        _ => 0.1,
    }
}

fn chat_score(interactions: u32) -> f64 {
    match interactions {
        0 => 1.0,
        1..=2 => 0.7,
        3..=5 => 0.5,
        _ => 0.3,
    }
}

fn difficulty_gap_score(gap: f64) -> f64 {
    if gap >= 3.0 {
        1.0
    } else if gap >= 1.0 {
        0.8
    } else if gap >= -1.0 {
        0.6
    } else if gap >= -3.0 {
        0.4
    } else {
        0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BloomLevel;

    fn signal(is_correct: bool, spent: f64, expected: f64, hints: u32, chat: u32) -> AttemptSignal {
        AttemptSignal {
            is_correct,
            time_spent_secs: spent,
            expected_time_secs: expected,
            hints_used: hints,
            chat_interactions: chat,
            difficulty: 5.0,
            skill_level: 5.0,
            bloom_level: BloomLevel::Remember,
        }
    }

    #[test]
    fn time_ratio_tiers() {
        assert_eq!(time_ratio_score(0.4), 1.0);
        assert_eq!(time_ratio_score(0.5), 1.0);
        assert_eq!(time_ratio_score(1.0), 0.8);
        assert_eq!(time_ratio_score(1.5), 0.5);
        assert_eq!(time_ratio_score(2.0), 0.3);
        assert_eq!(time_ratio_score(2.1), 0.1);
    }

    #[test]
    fn hint_tiers() {
        assert_eq!(hint_score(0), 1.0);
        assert_eq!(hint_score(1), 0.7);
        assert_eq!(hint_score(2), 0.5);
        assert_eq!(hint_score(4), 0.3);
        assert_eq!(hint_score(5), 0.1);
    }

    #[test]
    fn chat_tiers() {
        assert_eq!(chat_score(0), 1.0);
        assert_eq!(chat_score(2), 0.7);
        assert_eq!(chat_score(5), 0.5);
        assert_eq!(chat_score(6), 0.3);
    }

    #[test]
    fn difficulty_gap_tiers() {
        assert_eq!(difficulty_gap_score(3.0), 1.0);
        assert_eq!(difficulty_gap_score(1.5), 0.8);
        assert_eq!(difficulty_gap_score(0.0), 0.6);
        assert_eq!(difficulty_gap_score(-2.0), 0.4);
        assert_eq!(difficulty_gap_score(-4.0), 0.2);
    }

    #[test]
    fn clean_on_time_correct_answer_scores_at_least_four() {
        let confidence = estimate(
            &signal(true, 30.0, 30.0, 0, 0),
            0.0,
            StudentType::Intermediate,
            &ConfidenceWeights::default(),
        );
        assert!(
            confidence >= 4,
            "clean correct answer should read as confident, got {confidence}"
        );
    }

    #[test]
    fn heavily_assisted_wrong_answer_scores_low() {
        let confidence = estimate(
            &signal(false, 90.0, 30.0, 6, 6),
            0.2,
            StudentType::Intermediate,
            &ConfidenceWeights::default(),
        );
        assert!(confidence <= 2, "assisted failure should read as unsure, got {confidence}");
    }

    #[test]
    fn struggler_boost_is_capped_at_top_score() {
        let confidence = estimate(
            &signal(true, 10.0, 30.0, 0, 0),
            1.0,
            StudentType::Struggler,
            &ConfidenceWeights::default(),
        );
        assert_eq!(confidence, 5);
    }

    #[test]
    fn advanced_grading_is_stricter_than_intermediate() {
        let sig = signal(true, 30.0, 30.0, 1, 0);
        let weights = ConfidenceWeights::default();
        let intermediate = estimate(&sig, 0.5, StudentType::Intermediate, &weights);
        let advanced = estimate(&sig, 0.5, StudentType::Advanced, &weights);
        assert!(advanced <= intermediate);
    }

    #[test]
    fn output_stays_in_range_at_the_extremes() {
        let weights = ConfidenceWeights::default();
        let mut hopeless = signal(false, 300.0, 30.0, 9, 9);
        hopeless.difficulty = 10.0;
        hopeless.skill_level = 1.0;
        let worst = estimate(&hopeless, 0.0, StudentType::Advanced, &weights);
        let best = estimate(&signal(true, 5.0, 30.0, 0, 0), 1.0, StudentType::Struggler, &weights);
        assert_eq!(best, 5);
        // The incorrect-answer floor of 0.2 keeps the minimum at 2.
        assert_eq!(worst, 2);
    }
}
