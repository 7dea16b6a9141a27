//! OpenAI-compatible chat completions client.
//!
//! Works against Groq (`https://api.groq.com/openai`) and any other server
//! implementing `POST /v1/chat/completions`: Ollama, vLLM, llama.cpp, etc.
//! Requests are blocking and non-streaming; the orchestrator speaks the
//! whole reply at once.

use super::{ChatMessage, LanguageModel};
use crate::config::LlmConfig;
use crate::error::{AssistantError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// LLM backend using an OpenAI-compatible HTTP API.
pub struct ChatCompletionsClient {
    config: LlmConfig,
    url: String,
    agent: ureq::Agent,
}

impl ChatCompletionsClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::GenerationUnavailable`] when no API key or
    /// model is configured.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AssistantError::GenerationUnavailable(
                "GROQ_API_KEY missing".to_owned(),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(AssistantError::GenerationUnavailable(
                "no model configured".to_owned(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_s))
            .build();
        let url = completions_url(&config.api_url);

        info!("API LLM configured: {url} model={}", config.model);

        Ok(Self {
            config: config.clone(),
            url,
            agent,
        })
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens,
        })
    }
}

impl LanguageModel for ChatCompletionsClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::to_string(&self.request_body(messages)).map_err(|e| {
            AssistantError::GenerationUnavailable(format!("JSON serialization failed: {e}"))
        })?;

        let started = Instant::now();
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .send_string(&body)
            .map_err(describe_http_error)?;

        let text = response.into_string().map_err(|e| {
            AssistantError::GenerationUnavailable(format!("read error: {e}"))
        })?;
        let reply = first_choice_text(&text)?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = reply.len(),
            "completion received"
        );
        Ok(reply)
    }
}

/// Model stand-in used when the real client cannot be configured.
///
/// Every call fails with the configuration problem so the orchestrator
/// takes its normal fallback path instead of refusing to start.
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl LanguageModel for UnavailableModel {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(AssistantError::GenerationUnavailable(self.reason.clone()))
    }
}

/// Build `{base}/v1/chat/completions`, tolerating a trailing `/v1` or `/`.
fn completions_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/chat/completions")
}

fn describe_http_error(err: ureq::Error) -> AssistantError {
    match err {
        ureq::Error::Status(code, response) => {
            let detail = response.into_string().unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            AssistantError::GenerationUnavailable(format!("API returned {code}: {detail}"))
        }
        ureq::Error::Transport(t) => {
            AssistantError::GenerationUnavailable(format!("API request failed: {t}"))
        }
    }
}

/// Extract `choices[0].message.content` from a completion response body.
fn first_choice_text(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AssistantError::GenerationUnavailable(format!("JSON parse error: {e}")))?;
    value["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_owned())
        .ok_or_else(|| {
            AssistantError::GenerationUnavailable("response contained no choices".to_owned())
        })
}
