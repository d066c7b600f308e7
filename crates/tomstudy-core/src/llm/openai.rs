//! OpenAI-compatible chat completions client.
//!
//! POST {base_url}/chat/completions
//! Headers:
//!   Authorization: Bearer {api_key}
//!   content-type: application/json

use async_trait::async_trait;

use crate::error::StudyError;
use crate::llm::{ChatModel, ChatRequest, ChatResponse, Usage};

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            temperature: 0.0,
        }
    }
}

pub struct OpenAiChatModel {
    config: ModelConfig,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StudyError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system
        })];
        for (role, content) in &request.messages {
            messages.push(serde_json::json!({
                "role": role.as_str(),
                "content": content
            }));
        }

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages
        });

        tracing::debug!(
            "Calling chat completions: {} (model: {})",
            url,
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| StudyError::AgentFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| StudyError::AgentFailed(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(StudyError::AgentFailed(format!(
                "API returned {}: {}",
                status, response_text
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| StudyError::AgentFailed(format!("Failed to parse response JSON: {}", e)))?;

        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| StudyError::AgentFailed("response has no message content".to_string()))?
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u
                .get("prompt_tokens")
                .or_else(|| u.get("input_tokens"))
                .and_then(|v| v.as_i64()),
            output_tokens: u
                .get("completion_tokens")
                .or_else(|| u.get("output_tokens"))
                .and_then(|v| v.as_i64()),
        });

        Ok(ChatResponse { content, usage })
    }
}
