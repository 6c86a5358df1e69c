//! OpenAI-compatible chat completions backend

use crate::{GatewayConfig, GenerationError, TextGenerationGateway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First non-blank completion
    pub(crate) fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .find(|content| !content.trim().is_empty())
    }
}

/// Backend speaking the `/chat/completions` protocol
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
}

impl OpenAiBackend {
    /// Create a backend from configuration and a resolved API key
    pub fn new(config: &GatewayConfig, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| GenerationError::Transport {
                provider: PROVIDER,
                source,
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url()),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub(crate) fn request<'a>(&'a self, system: Option<&'a str>, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        }
    }
}

#[async_trait]
impl TextGenerationGateway for OpenAiBackend {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(system_instruction, prompt))
            .send()
            .await
            .map_err(|source| GenerationError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = PROVIDER, status = status.as_u16(), "Generation request rejected");
            return Err(GenerationError::status(PROVIDER, status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::Decode {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;
        let text = parsed
            .into_text()
            .ok_or(GenerationError::EmptyResponse { provider: PROVIDER })?;

        tracing::info!(
            provider = PROVIDER,
            model = %self.model,
            prompt_chars = prompt.len(),
            response_chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation completed"
        );
        Ok(text)
    }
}
