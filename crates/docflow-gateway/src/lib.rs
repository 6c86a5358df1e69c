//! docflow Gateway
//!
//! Single abstraction over the hosted language models used for generation:
//! - [`TextGenerationGateway`] takes an optional system instruction and a prompt
//! - [`OpenAiBackend`] and [`GeminiBackend`] implement it over HTTP
//! - [`build_gateway`] picks the backend from [`GatewayConfig`]
//!
//! Callers never branch on the backend. Calls are not retried here; a
//! failure is reported to the caller as a [`GenerationError`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;

pub use config::{GatewayConfig, Provider};
pub use error::GenerationError;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use std::sync::Arc;

/// Text generation from an instruction and prompt
#[async_trait]
pub trait TextGenerationGateway: Send + Sync {
    /// Generate text for `prompt`, optionally steered by a system instruction
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

/// Build the configured backend, reading its API key from the environment
pub fn build_gateway(
    config: &GatewayConfig,
) -> Result<Arc<dyn TextGenerationGateway>, GenerationError> {
    let env = config.api_key_env();
    let api_key = std::env::var(env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| GenerationError::MissingApiKey {
            env: env.to_string(),
        })?;
    build_gateway_with_key(config, api_key)
}

/// Build the configured backend with an explicit API key
pub fn build_gateway_with_key(
    config: &GatewayConfig,
    api_key: impl Into<String>,
) -> Result<Arc<dyn TextGenerationGateway>, GenerationError> {
    tracing::info!(provider = %config.provider, model = %config.model, "Text generation gateway configured");
    Ok(match config.provider {
        Provider::OpenAi => Arc::new(OpenAiBackend::new(config, api_key)?),
        Provider::Gemini => Arc::new(GeminiBackend::new(config, api_key)?),
    })
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
