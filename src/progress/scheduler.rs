//! Enhanced SM-2 review scheduling.
//!
//! Classic SM-2 drives the ease factor and interval ladder; the flow score
//! of the session then stretches or shrinks the interval by up to 20% in
//! either direction, and a review-level rule decides which Bloom level the
//! next review should exercise.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BloomLevel, TopicMasteryRecord};

/// SM-2 ease factor floor.
const MIN_EASE: f64 = 1.3;
/// Quality at or above this counts as a successful review.
const PASS_QUALITY: u8 = 3;
/// Quality at or above this is confident enough to escalate the level.
const CONFIDENT_QUALITY: u8 = 4;
/// Flow multiplier spans [0.8, 1.2] across the 0-100 flow score.
const FLOW_FLOOR: f64 = 0.8;
const FLOW_RANGE: f64 = 0.4;
/// Repetition count from which seasoned records alternate review levels.
const SEASONED_REPETITIONS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub quality: u8,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    /// 0-100 flow score observed while learning.
    pub flow_score: f64,
    /// Level the topic currently sits at.
    pub bloom_level: BloomLevel,
    /// When false, reviews never escalate beyond the current level.
    pub progressive_enabled: bool,
}

impl ScheduleInput {
    pub fn from_record(record: &TopicMasteryRecord, quality: u8, progressive_enabled: bool) -> Self {
        Self {
            quality,
            ease_factor: record.ease_factor,
            interval_days: record.interval_days,
            repetitions: record.repetitions,
            flow_score: record.flow.flow_score,
            bloom_level: record.bloom.current_level,
            progressive_enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    /// Level the next review should exercise.
    pub review_bloom_level: BloomLevel,
    /// True when the next review targets a level above the current one.
    pub progressive_challenge: bool,
}

/// Computes the next review from one graded attempt.
pub fn schedule(input: &ScheduleInput, now: DateTime<Utc>) -> ScheduleOutcome {
    let quality = input.quality.min(5);
    let q = f64::from(quality);

    let shortfall = 5.0 - q;
    let ease_factor =
        (input.ease_factor + 0.1 - shortfall * (0.08 + shortfall * 0.02)).max(MIN_EASE);

    let (repetitions, base_interval) = if quality < PASS_QUALITY {
        // Failure restarts the schedule.
        (0, 1.0)
    } else {
        let repetitions = input.repetitions + 1;
        let interval = match repetitions {
            1 => 1.0,
            2 => 6.0,
            _ => (f64::from(input.interval_days) * ease_factor).round(),
        };
        (repetitions, interval)
    };

    let flow_multiplier = FLOW_FLOOR + (input.flow_score.clamp(0.0, 100.0) / 100.0) * FLOW_RANGE;
    let interval_days = ((base_interval * flow_multiplier).round()).max(1.0) as u32;

    let review_bloom_level = review_level(
        quality,
        repetitions,
        input.bloom_level,
        input.progressive_enabled,
    );

    ScheduleOutcome {
        ease_factor,
        interval_days,
        repetitions,
        next_review: now + Duration::days(i64::from(interval_days)),
        review_bloom_level,
        progressive_challenge: review_bloom_level > input.bloom_level,
    }
}

/// Picks the Bloom level of the next review. Rules apply in order with the
/// last match winning, so the seasoned-record alternation overrides plain
/// escalation.
fn review_level(
    quality: u8,
    repetitions: u32,
    level: BloomLevel,
    progressive_enabled: bool,
) -> BloomLevel {
    if !progressive_enabled {
        return level;
    }

    let mut target = level;
    if repetitions >= 2 && quality >= CONFIDENT_QUALITY && level < BloomLevel::Create {
        target = level.next();
    }
    if repetitions >= SEASONED_REPETITIONS && level >= BloomLevel::Apply {
        target = if repetitions % 2 == 1 { level.next() } else { level };
    }
    target
}

/// Sort key for due reviews; higher means review sooner. Never a hard gate.
pub fn review_priority(
    next_review: Option<DateTime<Utc>>,
    mastery: f64,
    total_attempts: u32,
    flow_score: f64,
    now: DateTime<Utc>,
) -> f64 {
    let overdue_days = next_review
        .map(|due| (now - due).num_days().max(0) as f64)
        .unwrap_or(0.0);
    let mastery_gap = (100.0 - mastery.clamp(0.0, 100.0)) / 100.0;
    let familiarity = (f64::from(total_attempts) / 10.0).min(1.0);
    let flow_gap = (100.0 - flow_score.clamp(0.0, 100.0)) / 100.0;

    overdue_days * 2.0 + mastery_gap * 5.0 + familiarity * 3.0 + flow_gap * 2.0
}
