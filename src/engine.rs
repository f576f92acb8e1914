//! Engine facade: holds the configuration and the evaluator, validates
//! input at the boundary, and wires the per-attempt pipeline together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::{
    ExplanationAssessment, ExplanationEvaluator, ExplanationRequest, HeuristicEvaluator,
    RemoteEvaluator,
};
use crate::flow::behavior::{
    self, BehaviorAssessment, BehaviorSample, BreakRecommendation, DifficultyAdjustment,
};
use crate::flow::zone::{self, FlowAssessment};
use crate::progress::bloom::{self, BloomUpdate};
use crate::progress::scheduler::{self, ScheduleInput, ScheduleOutcome};
use crate::selection::aggregate::{
    self, GuidedSessionOutcome, StructuredPracticeSnapshot, UnifiedTopicMastery,
};
use crate::selection::profile::{self, LearnerProfile, SessionSummary};
use crate::selection::selector::{self, CatalogTopic, TopicSelection};
use crate::signals::{confidence, quality};
use crate::types::{
    validate_rate, validate_scale, AttemptSignal, BloomLevel, BloomProgress, StudentType,
    TopicMasteryRecord,
};

/// Attempts after which new evidence carries full weight in the overall
/// mastery average.
const MASTERY_EVIDENCE_WINDOW: u32 = 10;

/// Everything derived from one processed attempt, plus the rewritten record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    /// Behavioral confidence, 1-5.
    pub confidence: u8,
    /// SM-2 recall quality, 0-5.
    pub quality: u8,
    pub flow: FlowAssessment,
    pub bloom: BloomUpdate,
    pub schedule: ScheduleOutcome,
    /// The record as it should be persisted after this attempt.
    pub record: TopicMasteryRecord,
}

pub struct MasteryEngine {
    config: EngineConfig,
    evaluator: Box<dyn ExplanationEvaluator>,
    heuristic: HeuristicEvaluator,
}

impl MasteryEngine {
    /// Builds an engine whose remote evaluator follows `config.evaluator`.
    pub fn new(config: EngineConfig) -> Self {
        let evaluator: Box<dyn ExplanationEvaluator> =
            Box::new(RemoteEvaluator::new(config.evaluator.clone()));
        Self::with_evaluator(config, evaluator)
    }

    /// Builds an engine around an injected evaluator implementation.
    pub fn with_evaluator(config: EngineConfig, evaluator: Box<dyn ExplanationEvaluator>) -> Self {
        Self {
            config,
            evaluator,
            heuristic: HeuristicEvaluator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Behavioral confidence from one attempt, 1-5.
    ///
    /// `previous_accuracy` is the learner's accuracy on this topic before
    /// the attempt, 0 for a first encounter.
    pub fn estimate_confidence(
        &self,
        signal: &AttemptSignal,
        previous_accuracy: f64,
        student_type: StudentType,
    ) -> Result<u8, EngineError> {
        signal.validate()?;
        validate_rate("previousAccuracy", previous_accuracy)?;
        Ok(confidence::estimate(
            signal,
            previous_accuracy,
            student_type,
            &self.config.confidence,
        ))
    }

    /// SM-2 recall quality from correctness, help taken and confidence.
    pub fn score_quality(&self, signal: &AttemptSignal, confidence: u8) -> Result<u8, EngineError> {
        signal.validate()?;
        if !(1..=5).contains(&confidence) {
            return Err(EngineError::validation(
                "confidence",
                format!("must be within [1, 5], got {confidence}"),
            ));
        }
        Ok(quality::score(signal, confidence))
    }

    /// Zone and flow score from the challenge/skill balance, both on the
    /// 1-10 scale.
    pub fn classify_flow(&self, challenge: f64, skill: f64) -> Result<FlowAssessment, EngineError> {
        validate_scale("challenge", challenge)?;
        validate_scale("skill", skill)?;
        Ok(zone::classify(challenge, skill))
    }

    /// Zone detection from behavior alone, with a vote-share confidence.
    pub fn detect_flow_from_behavior(
        &self,
        sample: &BehaviorSample,
    ) -> Result<BehaviorAssessment, EngineError> {
        sample.validate()?;
        Ok(behavior::detect_from_behavior(sample))
    }

    /// Next-question difficulty recommendation for the detected zone.
    pub fn adjust_for_flow(
        &self,
        current_difficulty: f64,
        skill: f64,
        sample: &BehaviorSample,
    ) -> Result<DifficultyAdjustment, EngineError> {
        validate_scale("currentDifficulty", current_difficulty)?;
        validate_scale("skillLevel", skill)?;
        sample.validate()?;
        Ok(behavior::adjust_for_flow(current_difficulty, skill, sample))
    }

    /// Break suggestion driven by one topic's record.
    pub fn should_suggest_break(&self, record: &TopicMasteryRecord) -> BreakRecommendation {
        let scores: Vec<f64> = record.flow.recent_scores.iter().copied().collect();
        behavior::should_suggest_break(
            record.flow.time_in_anxiety_minutes,
            record.consecutive_failures,
            &scores,
            &self.config.flow,
        )
    }

    /// Folds one graded attempt into the per-level Bloom progress.
    pub fn update_bloom_progress(
        &self,
        progress: &mut BloomProgress,
        level: BloomLevel,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<BloomUpdate, EngineError> {
        validate_quality(quality)?;
        Ok(bloom::apply_attempt(progress, level, quality, now))
    }

    /// Next review date, interval, ease and review level from one attempt.
    pub fn schedule_next_review(
        &self,
        input: &ScheduleInput,
        now: DateTime<Utc>,
    ) -> Result<ScheduleOutcome, EngineError> {
        validate_quality(input.quality)?;
        Ok(scheduler::schedule(input, now))
    }

    /// Sort key for due reviews; higher means review sooner.
    pub fn review_priority(
        &self,
        next_review: Option<DateTime<Utc>>,
        mastery: f64,
        total_attempts: u32,
        flow_score: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        scheduler::review_priority(next_review, mastery, total_attempts, flow_score, now)
    }

    /// Merges structured and guided evidence into unified per-topic rows.
    pub fn aggregate_mastery(
        &self,
        structured: &[StructuredPracticeSnapshot],
        guided: &[GuidedSessionOutcome],
        now: DateTime<Utc>,
    ) -> Vec<UnifiedTopicMastery> {
        aggregate::aggregate(structured, guided, now)
    }

    /// Picks the next topic for the learner from the subject catalog.
    pub fn select_topic(
        &self,
        catalog: &[CatalogTopic],
        rows: &[UnifiedTopicMastery],
        recent_topics: &[String],
    ) -> Result<TopicSelection, EngineError> {
        selector::select_topic(catalog, rows, recent_topics, &self.config.selector)
    }

    /// Classifies the learner and derives session preferences.
    pub fn build_learner_profile(
        &self,
        skill_level: u8,
        rows: &[UnifiedTopicMastery],
    ) -> Result<LearnerProfile, EngineError> {
        validate_scale("skillLevel", f64::from(skill_level))?;
        Ok(profile::build(skill_level, rows))
    }

    /// Moves the skill level after a completed session.
    pub fn adapt_skill_level(
        &self,
        current: f64,
        session: &SessionSummary,
    ) -> Result<u8, EngineError> {
        validate_scale("skillLevel", current)?;
        validate_rate("accuracy", session.accuracy)?;
        Ok(profile::adapt_skill_level(current, session))
    }

    /// Runs the full per-attempt pipeline and returns the rewritten record
    /// along with every derived signal.
    ///
    /// The input record is untouched; persisting `outcome.record` is the
    /// caller's job.
    pub fn process_attempt(
        &self,
        record: &TopicMasteryRecord,
        signal: &AttemptSignal,
        student_type: StudentType,
        now: DateTime<Utc>,
    ) -> Result<AttemptOutcome, EngineError> {
        signal.validate()?;

        let confidence = confidence::estimate(
            signal,
            record.accuracy_rate,
            student_type,
            &self.config.confidence,
        );
        let quality = quality::score(signal, confidence);

        let mut updated = record.clone();

        let bloom = bloom::apply_attempt(&mut updated.bloom, signal.bloom_level, quality, now);

        let flow = zone::classify(signal.difficulty, signal.skill_level);
        updated.flow.observe(
            flow.zone,
            flow.score,
            signal.difficulty,
            signal.skill_level,
            signal.time_spent_secs / 60.0,
        );

        // Scheduling reads the post-attempt flow score and Bloom level, but
        // still the pre-attempt ease/interval/repetitions.
        let input = ScheduleInput::from_record(
            &updated,
            quality,
            self.config.features.progressive_challenge,
        );
        let schedule = scheduler::schedule(&input, now);

        updated.total_attempts = updated.total_attempts.saturating_add(1);
        let attempts = f64::from(updated.total_attempts);
        let correct = if signal.is_correct { 1.0 } else { 0.0 };
        updated.accuracy_rate = (updated.accuracy_rate * (attempts - 1.0) + correct) / attempts;

        let weight =
            f64::from(updated.total_attempts.min(MASTERY_EVIDENCE_WINDOW)) / f64::from(MASTERY_EVIDENCE_WINDOW);
        let evidence = f64::from(quality) / 5.0 * 100.0;
        updated.mastery_level =
            (updated.mastery_level * (1.0 - weight) + evidence * weight).clamp(0.0, 100.0);

        updated.push_quality(quality);
        updated.consecutive_failures = if signal.is_correct {
            0
        } else {
            updated.consecutive_failures.saturating_add(1)
        };
        updated.last_practiced = Some(now);
        updated.ease_factor = schedule.ease_factor;
        updated.interval_days = schedule.interval_days;
        updated.repetitions = schedule.repetitions;
        updated.next_review = Some(schedule.next_review);
        updated.review_bloom_level = Some(schedule.review_bloom_level);

        tracing::debug!(
            topic = %updated.topic,
            confidence,
            quality,
            zone = flow.zone.as_str(),
            interval_days = schedule.interval_days,
            "processed attempt"
        );

        Ok(AttemptOutcome {
            confidence,
            quality,
            flow,
            bloom,
            schedule,
            record: updated,
        })
    }

    /// Grades a free-text explanation, preferring the remote evaluator and
    /// falling back to the local heuristic. Never fails.
    pub async fn evaluate_explanation(&self, request: &ExplanationRequest) -> ExplanationAssessment {
        if self.config.features.remote_evaluator && self.evaluator.is_available() {
            match self.evaluator.evaluate(request).await {
                Ok(assessment) => return assessment,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        topic = %request.topic,
                        "remote evaluation failed, falling back to heuristic"
                    );
                }
            }
        }
        self.heuristic.assess(request)
    }
}

fn validate_quality(quality: u8) -> Result<(), EngineError> {
    if quality > 5 {
        return Err(EngineError::validation(
            "quality",
            format!("must be within [0, 5], got {quality}"),
        ));
    }
    Ok(())
}
