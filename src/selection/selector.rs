//! Ranks a subject's topic catalog for one learner.
//!
//! Four component scores (spaced-repetition urgency, Bloom readiness, flow
//! fit, continuity), each 0-100, blend into a weighted total. A learner with
//! no history short-circuits to the catalog's first foundational topic,
//! since every component would be an uninformative tie.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::SelectorWeights;
use crate::error::EngineError;
use crate::selection::aggregate::UnifiedTopicMastery;
use crate::types::{BloomLevel, SelectionType};

/// Mastery a prerequisite needs before dependents unlock.
const PREREQ_MASTERY: f64 = 50.0;
/// Catalog priority at or below this marks a foundational topic.
const FOUNDATIONAL_PRIORITY: u32 = 6;
const CORE_PRIORITY: u32 = 10;
/// Accuracy below this makes a weak area eligible for scaffolded review.
const SCAFFOLD_ACCURACY: f64 = 0.4;

/// One entry of a subject's fixed topic catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTopic {
    pub name: String,
    /// Sequencing priority; 1 is the first foundational topic.
    pub priority: u32,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    pub spaced_repetition: f64,
    pub bloom: f64,
    pub flow: f64,
    pub continuity: f64,
}

/// A scored candidate; lives only for the duration of one selection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCandidate {
    pub name: String,
    pub priority: u32,
    pub scores: ComponentScores,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSelection {
    pub topic_name: String,
    pub bloom_level: BloomLevel,
    pub selection_type: SelectionType,
    pub total_score: f64,
    pub scores: ComponentScores,
    pub reason: String,
}

/// Scores every catalog topic against the learner's unified rows.
/// `recent_topics` holds topic names covered in the last 3 completed
/// sessions; matching is case-insensitive throughout.
pub fn rank_topics(
    catalog: &[CatalogTopic],
    rows: &[UnifiedTopicMastery],
    recent_topics: &[String],
    weights: &SelectorWeights,
) -> Vec<TopicCandidate> {
    let mut candidates: Vec<TopicCandidate> = catalog
        .iter()
        .map(|topic| {
            let row = find_row(rows, &topic.name);
            let scores = ComponentScores {
                spaced_repetition: spaced_repetition_score(row),
                bloom: bloom_score(topic, row, rows),
                flow: flow_fit_score(row),
                continuity: continuity_score(topic, row, recent_topics),
            };
            let weighted = weights.spaced_repetition * scores.spaced_repetition
                + weights.bloom * scores.bloom
                + weights.flow * scores.flow
                + weights.continuity * scores.continuity;
            TopicCandidate {
                name: topic.name.clone(),
                priority: topic.priority,
                scores,
                total: weighted / weights.total().max(1e-6),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

/// Picks the next topic for the learner.
pub fn select_topic(
    catalog: &[CatalogTopic],
    rows: &[UnifiedTopicMastery],
    recent_topics: &[String],
    weights: &SelectorWeights,
) -> Result<TopicSelection, EngineError> {
    if catalog.is_empty() {
        return Err(EngineError::validation(
            "catalog",
            "must contain at least one topic",
        ));
    }

    if rows.is_empty() {
        // Cold start: no history in this subject, scoring would be a tie.
        let first = catalog
            .iter()
            .min_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)))
            .ok_or_else(|| EngineError::validation("catalog", "must contain at least one topic"))?;
        tracing::info!(topic = %first.name, "cold start, picking the first foundational topic");
        return Ok(TopicSelection {
            topic_name: first.name.clone(),
            bloom_level: BloomLevel::Remember,
            selection_type: SelectionType::NewTopic,
            total_score: 0.0,
            scores: ComponentScores::default(),
            reason: "no practice history yet, starting at the beginning of the sequence"
                .to_string(),
        });
    }

    let ranked = rank_topics(catalog, rows, recent_topics, weights);
    // rank_topics yields one candidate per catalog entry, so this cannot
    // be empty here; the guard keeps the error path honest anyway.
    let top = ranked.first().ok_or_else(|| {
        EngineError::validation("catalog", "must contain at least one topic")
    })?;

    let row = find_row(rows, &top.name);
    let selection_type = selection_type(top, row);
    let bloom_level = match row {
        Some(row) => row.review_bloom_level.unwrap_or(row.current_bloom_level),
        None => BloomLevel::Remember,
    };

    tracing::debug!(
        topic = %top.name,
        total = top.total,
        selection_type = selection_type.as_str(),
        "selected next topic"
    );

    Ok(TopicSelection {
        topic_name: top.name.clone(),
        bloom_level,
        selection_type,
        total_score: top.total,
        scores: top.scores,
        reason: selection_reason(selection_type, top, bloom_level),
    })
}

fn find_row<'a>(rows: &'a [UnifiedTopicMastery], name: &str) -> Option<&'a UnifiedTopicMastery> {
    rows.iter().find(|row| row.topic.eq_ignore_ascii_case(name))
}

/// 0-100. Never-practiced topics get a neutral 40; due topics scale with
/// how overdue they are; recently practiced ones climb a rest staircase.
fn spaced_repetition_score(row: Option<&UnifiedTopicMastery>) -> f64 {
    let Some(row) = row else { return 40.0 };
    let Some(days) = row.days_since_practice else { return 40.0 };

    if row.spaced_repetition_due {
        let interval = f64::from(row.optimal_interval_days);
        let overdue = (days as f64 - interval) / interval.max(1.0);
        let urgency = overdue.clamp(0.0, 1.0);
        return (urgency * 100.0 + 20.0).min(100.0);
    }
    if days > 30 {
        80.0
    } else if days > 14 {
        60.0
    } else if days > 7 {
        40.0
    } else {
        20.0
    }
}

/// 0-100 readiness for deeper cognitive work.
fn bloom_score(
    topic: &CatalogTopic,
    row: Option<&UnifiedTopicMastery>,
    rows: &[UnifiedTopicMastery],
) -> f64 {
    if !prerequisites_met(topic, rows) {
        return 20.0;
    }
    let Some(row) = row else {
        return if topic.priority <= CORE_PRIORITY { 80.0 } else { 60.0 };
    };
    if row.mastery_level >= 70.0 && row.current_bloom_level < BloomLevel::Apply {
        90.0
    } else if (40.0..70.0).contains(&row.mastery_level) {
        70.0
    } else {
        50.0
    }
}

/// 0-100 fit with the proximal-development band.
fn flow_fit_score(row: Option<&UnifiedTopicMastery>) -> f64 {
    let Some(row) = row else { return 60.0 };
    if (50.0..=80.0).contains(&row.mastery_level) {
        90.0
    } else if row.weak_area && row.accuracy_rate < SCAFFOLD_ACCURACY {
        70.0
    } else if row.mastery_level > 85.0 {
        40.0
    } else if row.mastery_level < 30.0 {
        60.0
    } else {
        70.0
    }
}

/// 0-100 continuity with recent work and the catalog sequence.
fn continuity_score(
    topic: &CatalogTopic,
    row: Option<&UnifiedTopicMastery>,
    recent_topics: &[String],
) -> f64 {
    let mut score: f64 = 50.0;
    if recent_topics
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&topic.name))
    {
        score += 25.0;
    }
    if row.is_some_and(|row| !row.concept_gaps.is_empty()) {
        score += 30.0;
    }
    if row.is_none() && topic.priority <= FOUNDATIONAL_PRIORITY {
        score += 15.0;
    }
    if topic.priority <= CORE_PRIORITY {
        score += 10.0;
    }
    score.min(100.0)
}

fn prerequisites_met(topic: &CatalogTopic, rows: &[UnifiedTopicMastery]) -> bool {
    topic.prerequisites.iter().all(|name| {
        find_row(rows, name).is_some_and(|row| row.mastery_level >= PREREQ_MASTERY)
    })
}

/// Tag for downstream explanation; first matching rule wins.
fn selection_type(candidate: &TopicCandidate, row: Option<&UnifiedTopicMastery>) -> SelectionType {
    let weak = row.is_some_and(|row| row.weak_area);
    let mastery = row.map(|row| row.mastery_level).unwrap_or(0.0);

    if weak && candidate.priority >= 7 {
        SelectionType::StrugglingSupport
    } else if candidate.scores.spaced_repetition >= 80.0 {
        SelectionType::SpacedRepetition
    } else if candidate.scores.continuity >= 80.0 {
        SelectionType::Continuation
    } else if candidate.scores.bloom >= 85.0 && mastery >= 70.0 {
        SelectionType::BloomProgression
    } else {
        SelectionType::NewTopic
    }
}

fn selection_reason(
    selection_type: SelectionType,
    candidate: &TopicCandidate,
    bloom_level: BloomLevel,
) -> String {
    match selection_type {
        SelectionType::StrugglingSupport => {
            format!("{} is a weak area that needs reinforcement", candidate.name)
        }
        SelectionType::SpacedRepetition => {
            format!("{} is due for review", candidate.name)
        }
        SelectionType::Continuation => {
            format!("{} continues recent session work", candidate.name)
        }
        SelectionType::BloomProgression => format!(
            "{} is ready for deeper work at the {} level",
            candidate.name,
            bloom_level.as_str()
        ),
        SelectionType::NewTopic => {
            format!("{} is the next topic in the sequence", candidate.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(topic: &str, mastery: f64, accuracy: f64) -> UnifiedTopicMastery {
        UnifiedTopicMastery {
            subject: "Math".to_string(),
            topic: topic.to_string(),
            mastery_level: mastery,
            accuracy_rate: accuracy,
            last_practiced: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            concept_gaps: Vec::new(),
            total_attempts: 5,
            current_bloom_level: BloomLevel::Understand,
            next_target_level: BloomLevel::Apply,
            review_bloom_level: Some(BloomLevel::Apply),
            flow_score: Some(70.0),
            weak_area: mastery < 50.0 || accuracy < 0.5,
            spaced_repetition_due: false,
            optimal_interval_days: 7,
            days_since_practice: Some(3),
        }
    }

    fn topic(name: &str, priority: u32) -> CatalogTopic {
        CatalogTopic {
            name: name.to_string(),
            priority,
            prerequisites: Vec::new(),
        }
    }

    #[test]
    fn cold_start_returns_the_first_foundational_topic() {
        let catalog = vec![topic("Algebra", 4), topic("Counting", 1), topic("Sets", 2)];
        let selection =
            select_topic(&catalog, &[], &[], &SelectorWeights::default()).unwrap();
        assert_eq!(selection.topic_name, "Counting");
        assert_eq!(selection.bloom_level, BloomLevel::Remember);
        assert_eq!(selection.selection_type, SelectionType::NewTopic);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let result = select_topic(&[], &[], &[], &SelectorWeights::default());
        assert!(result.is_err());
    }

    #[test]
    fn unmet_prerequisites_floor_the_bloom_score() {
        let mut gated = topic("Calculus", 12);
        gated.prerequisites = vec!["Algebra".to_string()];
        let rows = vec![row("Algebra", 30.0, 0.6)];
        assert_eq!(bloom_score(&gated, None, &rows), 20.0);

        let rows = vec![row("Algebra", 60.0, 0.8)];
        assert_eq!(bloom_score(&gated, None, &rows), 60.0, "met prereqs, fresh low-priority topic");
    }

    #[test]
    fn fresh_core_topics_score_higher_than_fringe_ones() {
        let rows = vec![row("Other", 50.0, 0.8)];
        assert_eq!(bloom_score(&topic("Core", 5), None, &rows), 80.0);
        assert_eq!(bloom_score(&topic("Fringe", 15), None, &rows), 60.0);
    }

    #[test]
    fn bloom_score_rewards_readiness_to_progress() {
        let ready = row("Fractions", 75.0, 0.9);
        assert_eq!(bloom_score(&topic("Fractions", 3), Some(&ready), &[ready.clone()]), 90.0);

        let mid = row("Fractions", 55.0, 0.8);
        assert_eq!(bloom_score(&topic("Fractions", 3), Some(&mid), &[mid.clone()]), 70.0);

        let low = row("Fractions", 20.0, 0.8);
        assert_eq!(bloom_score(&topic("Fractions", 3), Some(&low), &[low.clone()]), 50.0);
    }

    #[test]
    fn flow_fit_prefers_the_proximal_band() {
        assert_eq!(flow_fit_score(None), 60.0);
        assert_eq!(flow_fit_score(Some(&row("A", 65.0, 0.8))), 90.0);
        assert_eq!(flow_fit_score(Some(&row("B", 45.0, 0.3))), 70.0, "weak with scaffolding");
        assert_eq!(flow_fit_score(Some(&row("C", 90.0, 0.95))), 40.0, "too easy");
        assert_eq!(flow_fit_score(Some(&row("D", 20.0, 0.8))), 60.0);
        assert_eq!(flow_fit_score(Some(&row("E", 35.0, 0.8))), 70.0);
    }

    #[test]
    fn continuity_rewards_recent_work_and_gaps() {
        let recent = vec!["Fractions".to_string()];
        let mut gappy = row("Fractions", 60.0, 0.8);
        gappy.concept_gaps = vec!["denominators".to_string()];
        let score = continuity_score(&topic("Fractions", 5), Some(&gappy), &recent);
        assert_eq!(score, 100.0, "50 + 25 + 30 + 10 clamps to 100");

        let score = continuity_score(&topic("Unrelated", 20), None, &recent);
        assert_eq!(score, 50.0);

        let score = continuity_score(&topic("Foundation", 4), None, &[]);
        assert_eq!(score, 75.0, "50 + 15 foundational + 10 core");
    }

    #[test]
    fn due_topics_score_with_overdue_urgency() {
        let mut due = row("Fractions", 60.0, 0.8);
        due.spaced_repetition_due = true;
        due.optimal_interval_days = 7;
        due.days_since_practice = Some(14);
        // Overdue by a full interval: urgency 1.0 caps the score.
        assert_eq!(spaced_repetition_score(Some(&due)), 100.0);

        due.days_since_practice = Some(7);
        assert_eq!(spaced_repetition_score(Some(&due)), 20.0, "just due");

        due.days_since_practice = Some(10);
        let score = spaced_repetition_score(Some(&due));
        assert!(score > 20.0 && score < 100.0);
    }

    #[test]
    fn rested_topics_climb_the_staircase() {
        let mut rested = row("Fractions", 60.0, 0.8);
        rested.spaced_repetition_due = false;
        for (days, expected) in [(31, 80.0), (20, 60.0), (10, 40.0), (3, 20.0)] {
            rested.days_since_practice = Some(days);
            assert_eq!(spaced_repetition_score(Some(&rested)), expected, "{days} days");
        }
        assert_eq!(spaced_repetition_score(None), 40.0);
    }

    #[test]
    fn all_component_scores_stay_bounded() {
        let catalog = vec![topic("A", 1), topic("B", 8), topic("C", 15)];
        let rows = vec![row("A", 95.0, 0.99), row("B", 10.0, 0.1)];
        let ranked = rank_topics(&catalog, &rows, &["A".to_string()], &SelectorWeights::default());
        for candidate in &ranked {
            for score in [
                candidate.scores.spaced_repetition,
                candidate.scores.bloom,
                candidate.scores.flow,
                candidate.scores.continuity,
                candidate.total,
            ] {
                assert!((0.0..=100.0).contains(&score), "{}: {score}", candidate.name);
            }
        }
    }

    #[test]
    fn weak_high_priority_topics_tag_struggling_support() {
        let catalog = vec![topic("Hard", 9)];
        let rows = vec![row("Hard", 30.0, 0.3)];
        let selection = select_topic(&catalog, &rows, &[], &SelectorWeights::default()).unwrap();
        assert_eq!(selection.selection_type, SelectionType::StrugglingSupport);
        assert!(selection.reason.contains("weak area"));
    }

    #[test]
    fn due_review_tags_spaced_repetition() {
        let catalog = vec![topic("Fractions", 3)];
        let mut due = row("Fractions", 60.0, 0.8);
        due.spaced_repetition_due = true;
        due.days_since_practice = Some(21);
        let selection = select_topic(&catalog, &[due], &[], &SelectorWeights::default()).unwrap();
        assert_eq!(selection.selection_type, SelectionType::SpacedRepetition);
    }

    #[test]
    fn practiced_topics_review_at_the_scheduled_level() {
        let catalog = vec![topic("Fractions", 3)];
        let rows = vec![row("Fractions", 60.0, 0.8)];
        let selection = select_topic(&catalog, &rows, &[], &SelectorWeights::default()).unwrap();
        assert_eq!(selection.bloom_level, BloomLevel::Apply, "scheduler's review level wins");
    }

    #[test]
    fn ties_break_toward_the_earlier_catalog_entry() {
        let catalog = vec![topic("Later", 9), topic("Earlier", 2)];
        let ranked = rank_topics(&catalog, &[], &[], &SelectorWeights::default());
        assert!(ranked[0].total >= ranked[1].total);
        // Identical fresh-topic scores at equal priority bands resolve by
        // priority.
        if (ranked[0].total - ranked[1].total).abs() < 1e-9 {
            assert_eq!(ranked[0].name, "Earlier");
        }
    }
}
