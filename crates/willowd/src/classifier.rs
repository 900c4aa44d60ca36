//! External text-classification adapter (resolver tier 5).
//!
//! Last-resort call to a hosted text-understanding service. The adapter is
//! a trait seam so the service can be substituted with a local double; the
//! production implementation targets an Ollama-style chat endpoint.
//!
//! Failure semantics: any error here degrades to the neutral "unknown"
//! classification. One attempt, no retry, bounded by the configured timeout.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};
use willow_common::{Classification, SessionStage, SourceTier};

use crate::config::LlmConfig;

/// Text-completion collaborator boundary: `submit(system, user) -> text`.
///
/// Callers must tolerate non-JSON or malformed replies.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn submit(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Ollama-backed completion client
pub struct OllamaCompletion {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaCompletion {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl TextCompletion for OllamaCompletion {
    async fn submit(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.endpoint);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "stream": false,
            "format": "json",
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to classifier")?;

        if !response.status().is_success() {
            return Err(anyhow!("Classifier returned error {}", response.status()));
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to read classifier response")?;

        let content = json
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

/// Minimal context sent with the fallback request
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    pub stage: Option<SessionStage>,
    pub identified_categories: Vec<String>,
    pub child_age: Option<u8>,
}

/// Build the classifier system prompt - minimal, fixed label set
fn build_system_prompt() -> &'static str {
    r#"Classify a parent's message to a child-development screening assistant. Output JSON only:
{"intent":"<report_concern|service_question|request_callback|request_report|request_exercises|ask_reflex_info|greeting|answer|unknown>","response_type":"<assessment|pricing|about|callback|report|exercises|reflex_info|greeting|clarify>","confidence":0.9}
JSON ONLY."#
}

/// Build the user prompt with minimal session context
fn build_user_prompt(message: &str, context: &ClassifierContext) -> String {
    let stage = context
        .stage
        .map(|s| s.to_string())
        .unwrap_or_else(|| "initial".to_string());
    let categories = if context.identified_categories.is_empty() {
        "none".to_string()
    } else {
        context.identified_categories.join(",")
    };
    let age = context
        .child_age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Stage: {}\nCategories: {}\nChild age: {}\nMessage: {}",
        stage, categories, age, message
    )
}

/// Classify via the external service, degrading to unknown on any failure.
///
/// Returns the classification plus whether the adapter produced a usable
/// result (callers persist only usable results).
pub async fn classify_remote(
    completion: &dyn TextCompletion,
    message: &str,
    context: &ClassifierContext,
) -> Classification {
    let system = build_system_prompt();
    let user = build_user_prompt(message, context);

    match completion.submit(system, &user).await {
        Ok(response) => match parse_classification(&response) {
            Some(classification) => {
                info!(
                    "Classifier: intent={}, confidence={:.2}",
                    classification.intent, classification.confidence
                );
                classification
            }
            None => {
                warn!("Classifier returned unparseable reply, degrading to unknown");
                Classification::unknown()
            }
        },
        Err(e) => {
            warn!("Classifier call failed, degrading to unknown: {}", e);
            Classification::unknown()
        }
    }
}

/// Parse a classifier reply into a Classification.
///
/// Tries direct serde first, then code-fence stripping plus flexible
/// Value-based parsing with null-tolerant field access.
pub fn parse_classification(text: &str) -> Option<Classification> {
    let json_str = extract_json(text)?;
    let v: Value = serde_json::from_str(&json_str).ok()?;

    let intent = v
        .get("intent")
        .and_then(|x| x.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let response_type = v
        .get("response_type")
        .and_then(|x| x.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("clarify")
        .to_string();

    let confidence = v
        .get("confidence")
        .and_then(|x| x.as_f64())
        .unwrap_or(0.5)
        .clamp(0.0, 1.0) as f32;

    Some(Classification {
        intent,
        confidence,
        response_type,
        source_tier: SourceTier::Classifier,
    })
}

/// Extract JSON from a reply that may wrap it in prose or code fences
fn extract_json(response: &str) -> Option<String> {
    let t = response.trim();
    // Direct JSON
    if t.starts_with('{') && t.ends_with('}') {
        return Some(t.to_string());
    }
    // Markdown code block
    if let Some(s) = t.find("```json") {
        let rest = &t[s + 7..];
        if let Some(e) = rest.find("```") {
            let inner = rest[..e].trim();
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }
    // Plain code block
    if let Some(s) = t.find("```") {
        let rest = &t[s + 3..];
        if let Some(e) = rest.find("```") {
            let inner = rest[..e].trim();
            if inner.starts_with('{') {
                return Some(inner.to_string());
            }
        }
    }
    // Find JSON anywhere
    if let (Some(s), Some(e)) = (t.find('{'), t.rfind('}')) {
        if s < e {
            return Some(t[s..=e].to_string());
        }
    }
    None
}
