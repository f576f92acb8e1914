//! Free-text explanation grading as a capability with two strategies: a
//! remote AI evaluator and a local heuristic. Callers never see the remote
//! path fail; the engine falls back to the heuristic instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::BloomLevel;

pub mod heuristic;
pub mod remote;

pub use heuristic::HeuristicEvaluator;
pub use remote::RemoteEvaluator;

/// One explanation to grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationRequest {
    pub topic: String,
    pub explanation: String,
    /// Learner skill level, 1-10; scales the depth expected.
    pub student_level: u8,
}

/// Grading result; every numeric dimension is 0-100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationAssessment {
    pub clarity: f64,
    pub completeness: f64,
    pub accuracy: f64,
    /// Cognitive level the explanation demonstrates.
    pub bloom_level: BloomLevel,
    pub feedback: String,
}

/// Internal to the evaluator stack; recovered by the heuristic fallback and
/// never returned to engine callers.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluator not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
}

/// The grading capability. Implementations must be cheap to probe via
/// [`ExplanationEvaluator::is_available`] before paying for a call.
#[async_trait]
pub trait ExplanationEvaluator: Send + Sync {
    fn is_available(&self) -> bool;

    async fn evaluate(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationAssessment, EvaluatorError>;
}
