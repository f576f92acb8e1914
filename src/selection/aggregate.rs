//! Merges per-topic evidence from independent practice contexts into one
//! unified mastery row per (subject, topic).
//!
//! Structured drills carry real mastery numbers; guided sessions only carry
//! engagement and question counts, so their mastery contribution is a rough
//! proxy. When both exist the merge is optimistic: either context can earn
//! the credit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BloomLevel, TopicMasteryRecord};

/// Mastery or accuracy below these marks a topic for remediation.
const WEAK_MASTERY: f64 = 50.0;
const WEAK_ACCURACY: f64 = 0.5;
/// Engagement-to-mastery proxy for topics seen only in guided sessions.
const ENGAGEMENT_MASTERY_FACTOR: f64 = 0.5;

/// Per-topic snapshot taken from structured practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredPracticeSnapshot {
    pub subject: String,
    pub topic: String,
    pub accuracy_rate: f64,
    pub mastery_level: f64,
    pub current_bloom_level: BloomLevel,
    pub next_target_level: BloomLevel,
    pub review_bloom_level: Option<BloomLevel>,
    pub total_attempts: u32,
    pub flow_score: Option<f64>,
    /// Recurring error patterns observed in drills.
    pub error_patterns: Vec<String>,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl From<&TopicMasteryRecord> for StructuredPracticeSnapshot {
    fn from(record: &TopicMasteryRecord) -> Self {
        Self {
            subject: record.subject.clone(),
            topic: record.topic.clone(),
            accuracy_rate: record.accuracy_rate,
            mastery_level: record.mastery_level,
            current_bloom_level: record.bloom.current_level,
            next_target_level: record.bloom.next_target_level,
            review_bloom_level: record.review_bloom_level,
            total_attempts: record.total_attempts,
            flow_score: if record.flow.observations > 0 {
                Some(record.flow.flow_score)
            } else {
                None
            },
            error_patterns: Vec::new(),
            last_practiced: record.last_practiced,
        }
    }
}

/// Outcome of one guided (conversational) session on one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedSessionOutcome {
    pub subject: String,
    pub topic: String,
    pub questions_attempted: u32,
    pub questions_correct: u32,
    pub concepts_covered: Vec<String>,
    pub concepts_needing_work: Vec<String>,
    /// 0-100 session engagement.
    pub engagement_score: f64,
    pub completed_at: DateTime<Utc>,
}

/// One merged mastery row, ready for selection and profiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedTopicMastery {
    pub subject: String,
    pub topic: String,
    pub mastery_level: f64,
    pub accuracy_rate: f64,
    pub last_practiced: Option<DateTime<Utc>>,
    /// Concept gaps and error patterns, case-insensitively deduped.
    pub concept_gaps: Vec<String>,
    pub total_attempts: u32,
    pub current_bloom_level: BloomLevel,
    pub next_target_level: BloomLevel,
    pub review_bloom_level: Option<BloomLevel>,
    pub flow_score: Option<f64>,
    pub weak_area: bool,
    pub spaced_repetition_due: bool,
    pub optimal_interval_days: u32,
    pub days_since_practice: Option<i64>,
}

/// Interval a topic can rest before it counts as due: mastery stretches it
/// up to 6x and repetition count up to 3x more, capped.
pub fn optimal_interval_days(mastery: f64, attempts: u32) -> u32 {
    let mastery_stretch = 1.0 + mastery.clamp(0.0, 100.0) / 20.0;
    let repetition_stretch = (1.0 + f64::from(attempts) * 0.2).min(3.0);
    (mastery_stretch * repetition_stretch).round().max(1.0) as u32
}

/// Merges structured and guided evidence into one row per (subject, topic).
/// Topic keys match case-insensitively; the first-seen casing is kept.
pub fn aggregate(
    structured: &[StructuredPracticeSnapshot],
    guided: &[GuidedSessionOutcome],
    now: DateTime<Utc>,
) -> Vec<UnifiedTopicMastery> {
    let mut merged: BTreeMap<(String, String), UnifiedTopicMastery> = BTreeMap::new();

    for snapshot in structured {
        let key = topic_key(&snapshot.subject, &snapshot.topic);
        match merged.get_mut(&key) {
            None => {
                merged.insert(key, row_from_structured(snapshot));
            }
            Some(row) => merge_structured(row, snapshot),
        }
    }

    for session in guided {
        let key = topic_key(&session.subject, &session.topic);
        match merged.get_mut(&key) {
            None => {
                merged.insert(key, row_from_guided(session));
            }
            Some(row) => merge_guided(row, session),
        }
    }

    let mut rows: Vec<UnifiedTopicMastery> = merged.into_values().collect();
    for row in &mut rows {
        finalize(row, now);
    }
    rows
}

fn topic_key(subject: &str, topic: &str) -> (String, String) {
    (subject.to_ascii_lowercase(), topic.to_ascii_lowercase())
}

fn row_from_structured(snapshot: &StructuredPracticeSnapshot) -> UnifiedTopicMastery {
    let mut gaps = Vec::new();
    union_case_insensitive(&mut gaps, &snapshot.error_patterns);
    UnifiedTopicMastery {
        subject: snapshot.subject.clone(),
        topic: snapshot.topic.clone(),
        mastery_level: snapshot.mastery_level.clamp(0.0, 100.0),
        accuracy_rate: snapshot.accuracy_rate.clamp(0.0, 1.0),
        last_practiced: snapshot.last_practiced,
        concept_gaps: gaps,
        total_attempts: snapshot.total_attempts,
        current_bloom_level: snapshot.current_bloom_level,
        next_target_level: snapshot.next_target_level,
        review_bloom_level: snapshot.review_bloom_level,
        flow_score: snapshot.flow_score,
        weak_area: false,
        spaced_repetition_due: false,
        optimal_interval_days: 1,
        days_since_practice: None,
    }
}

fn row_from_guided(session: &GuidedSessionOutcome) -> UnifiedTopicMastery {
    let mut gaps = Vec::new();
    union_case_insensitive(&mut gaps, &session.concepts_needing_work);
    UnifiedTopicMastery {
        subject: session.subject.clone(),
        topic: session.topic.clone(),
        mastery_level: (session.engagement_score.clamp(0.0, 100.0) * ENGAGEMENT_MASTERY_FACTOR)
            .clamp(0.0, 100.0),
        accuracy_rate: session_accuracy(session),
        last_practiced: Some(session.completed_at),
        concept_gaps: gaps,
        total_attempts: session.questions_attempted,
        // Guided sessions carry no Bloom evidence.
        current_bloom_level: BloomLevel::Remember,
        next_target_level: BloomLevel::Understand,
        review_bloom_level: None,
        flow_score: None,
        weak_area: false,
        spaced_repetition_due: false,
        optimal_interval_days: 1,
        days_since_practice: None,
    }
}

fn merge_structured(row: &mut UnifiedTopicMastery, snapshot: &StructuredPracticeSnapshot) {
    merge_numbers(
        row,
        snapshot.mastery_level,
        snapshot.accuracy_rate,
        snapshot.last_practiced,
    );
    union_case_insensitive(&mut row.concept_gaps, &snapshot.error_patterns);
    row.total_attempts = row.total_attempts.saturating_add(snapshot.total_attempts);
    // Structured Bloom evidence wins over guided defaults.
    if snapshot.current_bloom_level > row.current_bloom_level {
        row.current_bloom_level = snapshot.current_bloom_level;
        row.next_target_level = snapshot.next_target_level;
    }
    if row.review_bloom_level.is_none() {
        row.review_bloom_level = snapshot.review_bloom_level;
    }
    if row.flow_score.is_none() {
        row.flow_score = snapshot.flow_score;
    }
}

fn merge_guided(row: &mut UnifiedTopicMastery, session: &GuidedSessionOutcome) {
    let proxy = (session.engagement_score.clamp(0.0, 100.0) * ENGAGEMENT_MASTERY_FACTOR)
        .clamp(0.0, 100.0);
    merge_numbers(row, proxy, session_accuracy(session), Some(session.completed_at));
    union_case_insensitive(&mut row.concept_gaps, &session.concepts_needing_work);
    row.total_attempts = row.total_attempts.saturating_add(session.questions_attempted);
}

/// The shared merge rule: mastery takes the max (credit either context),
/// accuracy the mean, last-practiced the later date.
fn merge_numbers(
    row: &mut UnifiedTopicMastery,
    mastery: f64,
    accuracy: f64,
    practiced: Option<DateTime<Utc>>,
) {
    row.mastery_level = row.mastery_level.max(mastery.clamp(0.0, 100.0));
    row.accuracy_rate = (row.accuracy_rate + accuracy.clamp(0.0, 1.0)) / 2.0;
    row.last_practiced = match (row.last_practiced, practiced) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
}

fn session_accuracy(session: &GuidedSessionOutcome) -> f64 {
    if session.questions_attempted == 0 {
        return 0.0;
    }
    (f64::from(session.questions_correct) / f64::from(session.questions_attempted)).clamp(0.0, 1.0)
}

fn finalize(row: &mut UnifiedTopicMastery, now: DateTime<Utc>) {
    row.weak_area = row.mastery_level < WEAK_MASTERY || row.accuracy_rate < WEAK_ACCURACY;
    row.optimal_interval_days = optimal_interval_days(row.mastery_level, row.total_attempts);
    row.days_since_practice = row.last_practiced.map(|at| (now - at).num_days());
    row.spaced_repetition_due = row
        .days_since_practice
        .is_some_and(|days| days >= i64::from(row.optimal_interval_days));
}

fn union_case_insensitive(into: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !into.iter().any(|existing| existing.eq_ignore_ascii_case(trimmed)) {
            into.push(trimmed.to_string());
        }
    }
}
