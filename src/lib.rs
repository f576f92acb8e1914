//! Adaptive mastery engine for a tutoring backend: behavioral confidence
//! and recall-quality scoring, flow-state tracking, Bloom-level
//! progression, SM-2 review scheduling, cross-context mastery aggregation,
//! topic selection and learner profiling.
//!
//! The crate is transport-agnostic. Callers own persistence and the API
//! surface; the engine owns the math. All entry points are pure
//! `(state, event) -> state` functions behind the [`MasteryEngine`] facade.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod flow;
pub mod progress;
pub mod selection;
pub mod signals;
pub mod types;

pub use config::EngineConfig;
pub use engine::{AttemptOutcome, MasteryEngine};
pub use error::EngineError;
pub use evaluator::{
    ExplanationAssessment, ExplanationEvaluator, ExplanationRequest, HeuristicEvaluator,
    RemoteEvaluator,
};
pub use flow::behavior::{
    BehaviorAssessment, BehaviorSample, BreakRecommendation, DifficultyAdjustment,
};
pub use flow::zone::FlowAssessment;
pub use progress::bloom::BloomUpdate;
pub use progress::scheduler::{ScheduleInput, ScheduleOutcome};
pub use selection::aggregate::{
    GuidedSessionOutcome, StructuredPracticeSnapshot, UnifiedTopicMastery,
};
pub use selection::profile::{LearnerProfile, SessionSummary};
pub use selection::selector::{CatalogTopic, ComponentScores, TopicSelection};
pub use types::{
    AttemptSignal, BloomLevel, BloomProgress, FlowMetrics, FlowZone, SelectionType, StudentType,
    TopicMasteryRecord,
};
