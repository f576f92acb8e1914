use serde::{Deserialize, Serialize};

/// Weights for the six confidence sub-scores. Overrides are normalized by
/// [`ConfidenceWeights::total`] so the blended score stays in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub correctness: f64,
    pub time: f64,
    pub hints: f64,
    pub chat: f64,
    pub history: f64,
    pub difficulty: f64,
}

impl ConfidenceWeights {
    pub fn total(&self) -> f64 {
        self.correctness + self.time + self.hints + self.chat + self.history + self.difficulty
    }
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            correctness: 0.35,
            time: 0.20,
            hints: 0.15,
            chat: 0.10,
            history: 0.10,
            difficulty: 0.10,
        }
    }
}

/// Break-suggestion thresholds and durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowParams {
    pub break_anxiety_minutes: f64,
    pub extended_anxiety_minutes: f64,
    pub break_failure_threshold: u32,
    pub extended_failure_threshold: u32,
    pub low_flow_mean: f64,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            break_anxiety_minutes: 10.0,
            extended_anxiety_minutes: 15.0,
            break_failure_threshold: 3,
            extended_failure_threshold: 5,
            low_flow_mean: 30.0,
            short_break_minutes: 5,
            long_break_minutes: 10,
        }
    }
}

/// Component weights for topic ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorWeights {
    pub spaced_repetition: f64,
    pub bloom: f64,
    pub flow: f64,
    pub continuity: f64,
}

impl SelectorWeights {
    pub fn total(&self) -> f64 {
        self.spaced_repetition + self.bloom + self.flow + self.continuity
    }
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            spaced_repetition: 0.30,
            bloom: 0.25,
            flow: 0.25,
            continuity: 0.20,
        }
    }
}

/// Remote explanation-evaluator endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl EvaluatorSettings {
    /// Both endpoint and key must be present for the remote path.
    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 20,
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// When off, reviews never escalate beyond the current Bloom level.
    pub progressive_challenge: bool,
    /// When off, explanation grading always uses the local heuristic.
    pub remote_evaluator: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            progressive_challenge: true,
            remote_evaluator: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub confidence: ConfidenceWeights,
    pub flow: FlowParams,
    pub selector: SelectorWeights,
    pub evaluator: EvaluatorSettings,
    pub features: FeatureFlags,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MASTERY_PROGRESSIVE_CHALLENGE") {
            config.features.progressive_challenge = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("MASTERY_REMOTE_EVALUATOR") {
            config.features.remote_evaluator = val.parse().unwrap_or(true);
        }

        config.evaluator.api_url = env_string("MASTERY_EVALUATOR_URL");
        config.evaluator.api_key = env_string("MASTERY_EVALUATOR_KEY");
        if let Some(model) = env_string("MASTERY_EVALUATOR_MODEL") {
            config.evaluator.model = model;
        }
        config.evaluator.timeout_secs =
            env_u64("MASTERY_EVALUATOR_TIMEOUT_SECS", config.evaluator.timeout_secs);

        config
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
