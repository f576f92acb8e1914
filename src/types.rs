//! Shared data model: Bloom levels, learner classification, attempt signals
//! and the per-topic mastery record that every component reads and rewrites.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Bounded history window kept on a mastery record.
pub const HISTORY_WINDOW: usize = 10;

/// The six cognitive levels of Bloom's taxonomy, ordered Remember → Create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyze,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    /// 1-based index used across the data model.
    pub fn index(&self) -> u8 {
        match self {
            BloomLevel::Remember => 1,
            BloomLevel::Understand => 2,
            BloomLevel::Apply => 3,
            BloomLevel::Analyze => 4,
            BloomLevel::Evaluate => 5,
            BloomLevel::Create => 6,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(BloomLevel::Remember),
            2 => Some(BloomLevel::Understand),
            3 => Some(BloomLevel::Apply),
            4 => Some(BloomLevel::Analyze),
            5 => Some(BloomLevel::Evaluate),
            6 => Some(BloomLevel::Create),
            _ => None,
        }
    }

    /// Next level up, saturating at Create.
    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(BloomLevel::Create)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BloomLevel::Remember => "remember",
            BloomLevel::Understand => "understand",
            BloomLevel::Apply => "apply",
            BloomLevel::Analyze => "analyze",
            BloomLevel::Evaluate => "evaluate",
            BloomLevel::Create => "create",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "remember" => Some(BloomLevel::Remember),
            "understand" => Some(BloomLevel::Understand),
            "apply" => Some(BloomLevel::Apply),
            "analyze" => Some(BloomLevel::Analyze),
            "evaluate" => Some(BloomLevel::Evaluate),
            "create" => Some(BloomLevel::Create),
            _ => None,
        }
    }
}

impl Default for BloomLevel {
    fn default() -> Self {
        BloomLevel::Remember
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentType {
    Struggler,
    Intermediate,
    Advanced,
}

impl StudentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentType::Struggler => "struggler",
            StudentType::Intermediate => "intermediate",
            StudentType::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "struggler" => Some(StudentType::Struggler),
            "intermediate" => Some(StudentType::Intermediate),
            "advanced" => Some(StudentType::Advanced),
            _ => None,
        }
    }
}

impl Default for StudentType {
    fn default() -> Self {
        StudentType::Intermediate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowZone {
    Boredom,
    Flow,
    Anxiety,
}

impl FlowZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowZone::Boredom => "boredom",
            FlowZone::Flow => "flow",
            FlowZone::Anxiety => "anxiety",
        }
    }
}

/// Why a topic was selected; downstream explanation only, never ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    StrugglingSupport,
    SpacedRepetition,
    Continuation,
    BloomProgression,
    NewTopic,
}

impl SelectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionType::StrugglingSupport => "struggling_support",
            SelectionType::SpacedRepetition => "spaced_repetition",
            SelectionType::Continuation => "continuation",
            SelectionType::BloomProgression => "bloom_progression",
            SelectionType::NewTopic => "new_topic",
        }
    }
}

/// One submitted answer, as observed by the tutoring surface.
///
/// Consumed once per attempt; only the derived confidence and quality are
/// persisted into the mastery record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSignal {
    pub is_correct: bool,
    pub time_spent_secs: f64,
    pub expected_time_secs: f64,
    pub hints_used: u32,
    pub chat_interactions: u32,
    /// Question difficulty on the 1-10 scale.
    pub difficulty: f64,
    /// Learner skill on the 1-10 scale.
    pub skill_level: f64,
    /// Cognitive level the question exercises.
    pub bloom_level: BloomLevel,
}

impl AttemptSignal {
    /// Rejects structurally invalid input before any computation.
    /// In-range values are never altered here; tiering happens downstream.
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
        validate_scale("difficulty", self.difficulty)?;
        validate_scale("skillLevel", self.skill_level)?;
        Ok(())
    }

    /// time spent / expected time.
    pub fn time_ratio(&self) -> f64 {
        self.time_spent_secs / self.expected_time_secs
    }
}

/// Checks a challenge/skill/difficulty value against the 1-10 scale.
pub(crate) fn validate_scale(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || !(1.0..=10.0).contains(&value) {
        return Err(EngineError::validation(
            field,
            format!("must be within [1, 10], got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_rate(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(EngineError::validation(
            field,
            format!("must be within [0, 1], got {value}"),
        ));
    }
    Ok(())
}

/// Mastery evidence at a single Bloom level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomLevelProgress {
    pub attempts: u32,
    /// 0-100.
    pub mastery: f64,
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Per-level progress plus the one-way level ratchet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomProgress {
    pub levels: [BloomLevelProgress; 6],
    /// Highest level that has reached mastery >= 80. Never decreases.
    pub current_level: BloomLevel,
    pub next_target_level: BloomLevel,
}

impl BloomProgress {
    pub fn level(&self, level: BloomLevel) -> &BloomLevelProgress {
        &self.levels[(level.index() - 1) as usize]
    }

    pub fn level_mut(&mut self, level: BloomLevel) -> &mut BloomLevelProgress {
        &mut self.levels[(level.index() - 1) as usize]
    }

    pub fn total_attempts(&self) -> u32 {
        self.levels.iter().map(|l| l.attempts).sum()
    }
}

impl Default for BloomProgress {
    fn default() -> Self {
        Self {
            levels: Default::default(),
            current_level: BloomLevel::Remember,
            next_target_level: BloomLevel::Understand,
        }
    }
}

/// Flow-state bookkeeping carried on the mastery record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetrics {
    pub average_challenge: f64,
    pub average_skill: f64,
    pub time_in_flow_minutes: f64,
    pub time_in_boredom_minutes: f64,
    pub time_in_anxiety_minutes: f64,
    /// Most recent flow score, 0-100.
    pub flow_score: f64,
    /// Last `HISTORY_WINDOW` flow scores, oldest first.
    pub recent_scores: VecDeque<f64>,
    /// Attempts folded into the running averages.
    pub observations: u32,
}

impl FlowMetrics {
    /// Folds one classified attempt into the running state.
    pub fn observe(&mut self, zone: FlowZone, score: f64, challenge: f64, skill: f64, minutes: f64) {
        self.observations = self.observations.saturating_add(1);
        let n = f64::from(self.observations);
        self.average_challenge += (challenge - self.average_challenge) / n;
        self.average_skill += (skill - self.average_skill) / n;
        match zone {
            FlowZone::Flow => self.time_in_flow_minutes += minutes,
            FlowZone::Boredom => self.time_in_boredom_minutes += minutes,
            FlowZone::Anxiety => self.time_in_anxiety_minutes += minutes,
        }
        self.flow_score = score.clamp(0.0, 100.0);
        if self.recent_scores.len() == HISTORY_WINDOW {
            self.recent_scores.pop_front();
        }
        self.recent_scores.push_back(self.flow_score);
    }

    pub fn mean_recent_score(&self) -> Option<f64> {
        if self.recent_scores.is_empty() {
            return None;
        }
        Some(self.recent_scores.iter().sum::<f64>() / self.recent_scores.len() as f64)
    }
}

impl Default for FlowMetrics {
    fn default() -> Self {
        Self {
            average_challenge: 0.0,
            average_skill: 0.0,
            time_in_flow_minutes: 0.0,
            time_in_boredom_minutes: 0.0,
            time_in_anxiety_minutes: 0.0,
            flow_score: 0.0,
            recent_scores: VecDeque::new(),
            observations: 0,
        }
    }
}

/// One learner's standing on one topic. Created on first attempt, rewritten
/// on every subsequent attempt, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMasteryRecord {
    pub subject: String,
    pub topic: String,
    /// Running mean of correctness, 0-1.
    pub accuracy_rate: f64,
    /// Overall mastery composite, 0-100.
    pub mastery_level: f64,
    /// SM-2 ease factor, never below 1.3.
    pub ease_factor: f64,
    pub interval_days: u32,
    /// Consecutive successful reviews; resets to 0 on failure.
    pub repetitions: u32,
    pub next_review: Option<DateTime<Utc>>,
    /// Bloom level the next review should target, once scheduled.
    pub review_bloom_level: Option<BloomLevel>,
    pub bloom: BloomProgress,
    pub flow: FlowMetrics,
    /// Last `HISTORY_WINDOW` quality scores, oldest first.
    pub quality_history: VecDeque<u8>,
    pub total_attempts: u32,
    pub consecutive_failures: u32,
    pub last_practiced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TopicMasteryRecord {
    /// Zero-initialized record for a first attempt. A missing record is a
    /// normal condition, not an error.
    pub fn new(subject: impl Into<String>, topic: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
            accuracy_rate: 0.0,
            mastery_level: 0.0,
            ease_factor: 2.5,
            interval_days: 0,
            repetitions: 0,
            next_review: None,
            review_bloom_level: None,
            bloom: BloomProgress::default(),
            flow: FlowMetrics::default(),
            quality_history: VecDeque::new(),
            total_attempts: 0,
            consecutive_failures: 0,
            last_practiced: None,
            created_at: now,
        }
    }

    pub fn push_quality(&mut self, quality: u8) {
        if self.quality_history.len() == HISTORY_WINDOW {
            self.quality_history.pop_front();
        }
        self.quality_history.push_back(quality.min(5));
    }

    /// Share of recent attempts with quality >= 3; falls back to the overall
    /// accuracy rate before any history exists.
    pub fn recent_accuracy(&self) -> f64 {
        if self.quality_history.is_empty() {
            return self.accuracy_rate;
        }
        let passed = self.quality_history.iter().filter(|q| **q >= 3).count();
        passed as f64 / self.quality_history.len() as f64
    }
}
