//! Chat-completions client for the remote explanation grader.
//!
//! One bounded request per evaluation, no internal retries; any failure is
//! handled by the caller's heuristic fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EvaluatorSettings;
use crate::evaluator::{
    EvaluatorError, ExplanationAssessment, ExplanationEvaluator, ExplanationRequest,
};
use crate::types::BloomLevel;

const SYSTEM_PROMPT: &str = "You grade a student's free-text explanation of a topic. \
Respond with strict JSON only, no prose: \
{\"clarity\":0-100,\"completeness\":0-100,\"accuracy\":0-100,\"bloomLevel\":1-6,\"feedback\":\"one or two sentences\"}. \
bloomLevel follows Bloom's taxonomy: 1 remember, 2 understand, 3 apply, 4 analyze, 5 evaluate, 6 create.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Assessment JSON as the model returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteAssessment {
    clarity: f64,
    completeness: f64,
    accuracy: f64,
    bloom_level: u8,
    feedback: String,
}

#[derive(Clone)]
pub struct RemoteEvaluator {
    settings: EvaluatorSettings,
    client: reqwest::Client,
}

impl RemoteEvaluator {
    pub fn new(settings: EvaluatorSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { settings, client }
    }

    fn completions_url(&self) -> Option<String> {
        self.settings
            .api_url
            .as_deref()
            .map(|base| format!("{}/chat/completions", base.trim_end_matches('/')))
    }

    fn build_payload(&self, request: &ExplanationRequest) -> serde_json::Value {
        let user = serde_json::json!({
            "topic": request.topic,
            "explanation": request.explanation,
            "studentLevel": request.student_level,
        });
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                ChatMessage { role: "system".into(), content: SYSTEM_PROMPT.into() },
                ChatMessage { role: "user".into(), content: user.to_string() },
            ],
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
            "stream": false,
        })
    }
}

#[async_trait]
impl ExplanationEvaluator for RemoteEvaluator {
    fn is_available(&self) -> bool {
        self.settings.is_configured()
    }

    async fn evaluate(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationAssessment, EvaluatorError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(EvaluatorError::NotConfigured("api key"))?;
        let url = self
            .completions_url()
            .ok_or(EvaluatorError::NotConfigured("api url"))?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_payload(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::HttpStatus { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(EvaluatorError::EmptyChoices)?;

        let parsed: RemoteAssessment = serde_json::from_str(strip_code_fences(content))?;
        Ok(ExplanationAssessment {
            clarity: parsed.clarity.clamp(0.0, 100.0),
            completeness: parsed.completeness.clamp(0.0, 100.0),
            accuracy: parsed.accuracy.clamp(0.0, 100.0),
            bloom_level: BloomLevel::from_index(parsed.bloom_level.clamp(1, 6))
                .unwrap_or(BloomLevel::Remember),
            feedback: parsed.feedback,
        })
    }
}

/// Models often wrap JSON in a markdown fence despite the prompt.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_end_matches('`').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EvaluatorSettings {
        EvaluatorSettings {
            api_url: Some("https://eval.test".to_string()),
            api_key: Some("sk-test".to_string()),
            ..EvaluatorSettings::default()
        }
    }

    #[test]
    fn availability_follows_configuration() {
        assert!(RemoteEvaluator::new(settings()).is_available());
        assert!(!RemoteEvaluator::new(EvaluatorSettings::default()).is_available());
    }

    #[test]
    fn completions_url_joins_without_double_slashes() {
        let mut with_slash = settings();
        with_slash.api_url = Some("https://eval.test/".to_string());
        let evaluator = RemoteEvaluator::new(with_slash);
        assert_eq!(
            evaluator.completions_url().as_deref(),
            Some("https://eval.test/chat/completions")
        );
    }

    #[test]
    fn payload_carries_model_and_both_messages() {
        let evaluator = RemoteEvaluator::new(settings());
        let request = ExplanationRequest {
            topic: "Photosynthesis".to_string(),
            explanation: "Plants turn light into sugar.".to_string(),
            student_level: 4,
        };
        let payload = evaluator.build_payload(&request);
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["role"], "user");
        let user: serde_json::Value =
            serde_json::from_str(payload["messages"][1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(user["topic"], "Photosynthesis");
        assert_eq!(user["studentLevel"], 4);
    }

    #[test]
    fn code_fences_are_stripped_before_parsing() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn remote_assessment_parses_camel_case() {
        let parsed: RemoteAssessment = serde_json::from_str(
            r#"{"clarity":80,"completeness":75,"accuracy":90,"bloomLevel":3,"feedback":"Good."}"#,
        )
        .unwrap();
        assert_eq!(parsed.bloom_level, 3);
        assert_eq!(parsed.clarity, 80.0);
    }
}
