//! Local explanation grader used when the remote evaluator is unavailable.
//!
//! Pure text heuristics, always available, infallible.

use async_trait::async_trait;

use crate::evaluator::{
    EvaluatorError, ExplanationAssessment, ExplanationEvaluator, ExplanationRequest,
};
use crate::types::BloomLevel;

const MIN_WORDS: usize = 10;
const JARGON_LEN: usize = 13;
const WEAK_DIMENSION: f64 = 60.0;

const ANALOGY_MARKERS: &[&str] = &["like a", "similar to", "imagine", "think of", "as if"];
const GIVE_UP_MARKERS: &[&str] = &["i don't know", "i dont know", "no idea"];
const HEDGE_MARKERS: &[&str] = &["maybe", "i think", "probably", "i guess", "might be", "not sure"];
const REASONING_MARKERS: &[&str] = &["because", "therefore", "which means", "leads to", "so that"];

const CREATE_MARKERS: &[&str] = &["design", "invent", "compose", "construct", "devise", "what if we"];
const EVALUATE_MARKERS: &[&str] = &["judge", "critique", "justify", "argue", "better than", "worse than"];
const ANALYZE_MARKERS: &[&str] = &["compare", "contrast", "break down", "differs", "relationship between"];
const APPLY_MARKERS: &[&str] = &["apply", "solve", "calculate", "for example", "for instance", "in practice"];
const UNDERSTAND_MARKERS: &[&str] = &["because", "explain", "means that", "in other words", "describe"];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEvaluator;

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Grades without I/O. Exposed so the facade can fall back synchronously.
    pub fn assess(&self, request: &ExplanationRequest) -> ExplanationAssessment {
        let text = request.explanation.to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();

        let clarity = clarity_score(&text, &words);
        let completeness = completeness_score(&request.topic, &text, words.len(), request.student_level);
        let accuracy = accuracy_score(&text, words.len());
        let bloom_level = infer_bloom_level(&text);
        let feedback = build_feedback(clarity, completeness, accuracy);

        ExplanationAssessment {
            clarity,
            completeness,
            accuracy,
            bloom_level,
            feedback,
        }
    }
}

#[async_trait]
impl ExplanationEvaluator for HeuristicEvaluator {
    fn is_available(&self) -> bool {
        true
    }

    async fn evaluate(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationAssessment, EvaluatorError> {
        Ok(self.assess(request))
    }
}

fn clarity_score(text: &str, words: &[&str]) -> f64 {
    if words.len() < MIN_WORDS {
        return 30.0;
    }

    let mut score: f64 = 85.0;

    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let avg_sentence_words = words.len() as f64 / sentences as f64;
    if avg_sentence_words > 25.0 {
        score -= 20.0;
    } else if avg_sentence_words > 18.0 {
        score -= 10.0;
    }

    let jargon = words
        .iter()
        .filter(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).len() >= JARGON_LEN)
        .count();
    let jargon_ratio = jargon as f64 / words.len() as f64;
    if jargon_ratio > 0.15 {
        score -= 25.0;
    } else if jargon_ratio > 0.08 {
        score -= 10.0;
    }

    if ANALOGY_MARKERS.iter().any(|m| text.contains(m)) {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

fn completeness_score(topic: &str, text: &str, word_count: usize, student_level: u8) -> f64 {
    let topic_tokens: Vec<String> = topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_lowercase)
        .collect();

    let coverage = if topic_tokens.is_empty() {
        1.0
    } else {
        let hit = topic_tokens.iter().filter(|t| text.contains(t.as_str())).count();
        hit as f64 / topic_tokens.len() as f64
    };

    // Stronger students are expected to develop the answer further.
    let expected_words = 20.0 + f64::from(student_level) * 10.0;
    let length_factor = (word_count as f64 / expected_words).min(1.0);

    (coverage * 60.0 + length_factor * 40.0).clamp(0.0, 100.0)
}

fn accuracy_score(text: &str, word_count: usize) -> f64 {
    let mut score = 70.0;

    if GIVE_UP_MARKERS.iter().any(|m| text.contains(m)) {
        score -= 40.0;
    }

    let hedges = HEDGE_MARKERS.iter().filter(|m| text.contains(*m)).count();
    score -= (hedges as f64 * 5.0).min(20.0);

    if word_count >= 40 {
        score += 10.0;
    }
    if REASONING_MARKERS.iter().any(|m| text.contains(m)) {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Deepest matching verb family wins.
fn infer_bloom_level(text: &str) -> BloomLevel {
    let families: [(&[&str], BloomLevel); 5] = [
        (CREATE_MARKERS, BloomLevel::Create),
        (EVALUATE_MARKERS, BloomLevel::Evaluate),
        (ANALYZE_MARKERS, BloomLevel::Analyze),
        (APPLY_MARKERS, BloomLevel::Apply),
        (UNDERSTAND_MARKERS, BloomLevel::Understand),
    ];
    for (markers, level) in families {
        if markers.iter().any(|m| text.contains(m)) {
            return level;
        }
    }
    BloomLevel::Remember
}

fn build_feedback(clarity: f64, completeness: f64, accuracy: f64) -> String {
    let mut notes = Vec::new();
    if clarity < WEAK_DIMENSION {
        notes.push("Break long sentences apart and prefer plain wording.");
    }
    if completeness < WEAK_DIMENSION {
        notes.push("Cover more of the topic's key ideas and develop the answer further.");
    }
    if accuracy < WEAK_DIMENSION {
        notes.push("Commit to a definite explanation and back claims with reasons.");
    }
    if notes.is_empty() {
        "Clear, well-developed explanation. Try pushing toward deeper analysis next.".to_string()
    } else {
        notes.join(" ")
    }
}
