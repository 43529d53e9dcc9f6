//! OpenAI generator implementation.

use async_trait::async_trait;
use tracing::debug;

use testloom_protocols::error::GenerateError;
use testloom_protocols::generator::TextGenerator;
use testloom_protocols::types::{Generation, TokenUsage, extract_fenced_blocks};

use crate::api::{ApiMessage, ApiRequest, ApiResponse};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f32 = 0.2;

/// OpenAI-backed text generator.
pub struct OpenAiGenerator {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_API_URL.to_string())
    }

    /// Create a generator with a custom API URL (for compatible services).
    pub fn with_url(api_key: String, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, prompt: &str, model: &str) -> ApiRequest {
        ApiRequest {
            model: model.to_string(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn id(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<Generation, GenerateError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(prompt, model))
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!(status, "openai call failed");
            return Err(GenerateError::Upstream { status, body });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerateError::Transport("response contained no choices".to_string()))?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(Generation::new(
            extract_fenced_blocks(&choice.message.content),
            usage,
        ))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
