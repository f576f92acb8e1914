//! Zone detection from observed behavior, and the difficulty/break
//! recommendations built on top of it.
//!
//! Five independent signal groups each vote 1-2 points into exactly one of
//! the three zones; the loaded bucket wins and the vote share becomes the
//! detection confidence.

use serde::{Deserialize, Serialize};

use crate::config::FlowParams;
use crate::error::EngineError;
use crate::types::{validate_rate, FlowZone};

/// Finishing in under half the expected time reads as boredom.
const RUSHED_RATIO: f64 = 0.5;
/// Taking more than twice the expected time reads as anxiety.
const SLOW_RATIO: f64 = 2.0;
/// Pace band treated as fully absorbed work.
const STEADY_RATIO: (f64, f64) = (0.8, 1.2);
/// Combined hints + retries that signal the learner is stuck.
const STUCK_HELP_COUNT: u32 = 3;
const HEAVY_PAUSES: u32 = 5;
const SOME_PAUSES: u32 = 2;
const CRUISING_ACCURACY: f64 = 0.9;
const FAILING_ACCURACY: f64 = 0.4;
const WORKING_ACCURACY: (f64, f64) = (0.6, 0.85);

/// Behavioral evidence from recent work on one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSample {
    pub is_correct: bool,
    pub time_spent_secs: f64,
    pub expected_time_secs: f64,
    pub hints_used: u32,
    pub retry_count: u32,
    pub pause_count: u32,
    /// Share of recent attempts answered correctly, 0-1.
    pub recent_accuracy: f64,
}

impl BehaviorSample {
    /// Rejects structurally invalid input before any computation.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.time_spent_secs.is_finite() || self.time_spent_secs < 0.0 {
            return Err(EngineError::validation(
                "timeSpentSecs",
                format!("must be a non-negative number, got {}", self.time_spent_secs),
            ));
        }
        if !self.expected_time_secs.is_finite() || self.expected_time_secs <= 0.0 {
            return Err(EngineError::validation(
                "expectedTimeSecs",
                format!("must be a positive number, got {}", self.expected_time_secs),
            ));
        }
        validate_rate("recentAccuracy", self.recent_accuracy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAssessment {
    pub zone: FlowZone,
    /// Winning bucket's share of all votes, 0-1.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdjustment {
    pub difficulty: f64,
    pub should_provide_hint: bool,
    pub zone: FlowZone,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRecommendation {
    pub should_break: bool,
    /// 0 when no break is suggested.
    pub duration_minutes: u32,
    pub reason: String,
}

#[derive(Debug, Default)]
struct ZoneVotes {
    boredom: u32,
    flow: u32,
    anxiety: u32,
}

impl ZoneVotes {
    fn total(&self) -> u32 {
        self.boredom + self.flow + self.anxiety
    }

    /// Ties resolve toward flow, then boredom.
    fn winner(&self) -> (FlowZone, u32) {
        let mut zone = FlowZone::Flow;
        let mut count = self.flow;
        if self.boredom > count {
            zone = FlowZone::Boredom;
            count = self.boredom;
        }
        if self.anxiety > count {
            zone = FlowZone::Anxiety;
            count = self.anxiety;
        }
        (zone, count)
    }
}

/// Detects the learner's zone from behavior alone, with a vote-share
/// confidence.
pub fn detect_from_behavior(sample: &BehaviorSample) -> BehaviorAssessment {
    let mut votes = ZoneVotes::default();

    let ratio = if sample.expected_time_secs > 0.0 {
        sample.time_spent_secs / sample.expected_time_secs
    } else {
        1.0
    };
    if ratio < RUSHED_RATIO {
        votes.boredom += 2;
    } else if ratio > SLOW_RATIO {
        votes.anxiety += 2;
    } else if (STEADY_RATIO.0..=STEADY_RATIO.1).contains(&ratio) {
        votes.flow += 2;
    } else {
        votes.flow += 1;
    }

    if sample.is_correct {
        votes.flow += 1;
    } else {
        votes.anxiety += 2;
    }

    let help = sample.hints_used + sample.retry_count;
    if help >= STUCK_HELP_COUNT {
        votes.anxiety += 2;
    } else if help == 0 {
        votes.flow += 1;
    } else {
        votes.anxiety += 1;
    }

    if sample.pause_count >= HEAVY_PAUSES {
        votes.boredom += 2;
    } else if sample.pause_count >= SOME_PAUSES {
        votes.boredom += 1;
    } else {
        votes.flow += 1;
    }

    let accuracy = sample.recent_accuracy.clamp(0.0, 1.0);
    if accuracy >= CRUISING_ACCURACY {
        votes.boredom += 2;
    } else if accuracy <= FAILING_ACCURACY {
        votes.anxiety += 2;
    } else if (WORKING_ACCURACY.0..=WORKING_ACCURACY.1).contains(&accuracy) {
        votes.flow += 2;
    } else {
        votes.flow += 1;
    }

    let (zone, count) = votes.winner();
    BehaviorAssessment {
        zone,
        confidence: f64::from(count) / f64::from(votes.total().max(1)),
    }
}

/// Recommends the next question difficulty from the detected zone.
///
/// The result never drops more than 2 points below the learner's skill and
/// stays on the 1-10 scale.
pub fn adjust_for_flow(
    current_difficulty: f64,
    skill: f64,
    sample: &BehaviorSample,
) -> DifficultyAdjustment {
    let assessment = detect_from_behavior(sample);
    let clean_correct = sample.is_correct && sample.hints_used == 0 && sample.retry_count == 0;

    let (delta, should_provide_hint, reason) = match assessment.zone {
        FlowZone::Boredom => (
            1.0,
            false,
            "signs of boredom, raising difficulty to re-engage".to_string(),
        ),
        FlowZone::Anxiety => (
            -1.0,
            true,
            "signs of anxiety, easing difficulty and offering a hint".to_string(),
        ),
        FlowZone::Flow => {
            if clean_correct {
                (
                    0.5,
                    false,
                    "in flow with a clean correct answer, nudging difficulty up".to_string(),
                )
            } else {
                (0.0, false, "in flow, holding difficulty steady".to_string())
            }
        }
    };

    let floor = (skill - 2.0).max(1.0);
    let difficulty = (current_difficulty + delta).clamp(floor, 10.0);

    DifficultyAdjustment {
        difficulty,
        should_provide_hint,
        zone: assessment.zone,
        reason,
    }
}

/// Suggests a rest when anxiety time, failure streaks or flow history say
/// the session has gone sour.
pub fn should_suggest_break(
    time_in_anxiety_minutes: f64,
    consecutive_failures: u32,
    recent_flow_scores: &[f64],
    params: &FlowParams,
) -> BreakRecommendation {
    let mean_flow = if recent_flow_scores.is_empty() {
        None
    } else {
        Some(recent_flow_scores.iter().sum::<f64>() / recent_flow_scores.len() as f64)
    };

    let anxious_too_long = time_in_anxiety_minutes > params.break_anxiety_minutes;
    let failing = consecutive_failures >= params.break_failure_threshold;
    let flow_collapsed = mean_flow.is_some_and(|m| m < params.low_flow_mean);

    if !(anxious_too_long || failing || flow_collapsed) {
        return BreakRecommendation {
            should_break: false,
            duration_minutes: 0,
            reason: "engagement is holding up".to_string(),
        };
    }

    let long_break = time_in_anxiety_minutes > params.extended_anxiety_minutes
        || consecutive_failures >= params.extended_failure_threshold;
    let duration = if long_break {
        params.long_break_minutes
    } else {
        params.short_break_minutes
    };

    let reason = if anxious_too_long {
        format!("{time_in_anxiety_minutes:.0} minutes spent in the anxiety zone")
    } else if failing {
        format!("{consecutive_failures} failures in a row")
    } else {
        "recent flow scores have collapsed".to_string()
    };

    BreakRecommendation {
        should_break: true,
        duration_minutes: duration,
        reason,
    }
}
