//! Backend selection from available credentials.
//!
//! Anthropic is preferred when its key is present; an OpenAI-compatible
//! backend is the fallback path. With no key at all, construction fails
//! before any filesystem activity.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Credentials, LlmSettings};
use crate::llm::anthropic::{AnthropicClient, AnthropicConfig};
use crate::llm::client::{LlmError, ModelClient};
use crate::llm::openai::{OpenAiClient, OpenAiConfig};

/// Build a model client for the first backend with usable credentials.
pub fn build_client(
    credentials: &Credentials,
    settings: &LlmSettings,
) -> Result<Arc<dyn ModelClient>, LlmError> {
    if let Some(key) = &credentials.anthropic_api_key {
        let mut config = match &settings.model {
            Some(model) => AnthropicConfig::with_model(model),
            None => AnthropicConfig::default(),
        };
        config.max_tokens = settings.max_tokens;
        config.timeout = Duration::from_millis(settings.timeout_ms);

        log::info!("Selected Anthropic backend, model {}", config.model);
        return Ok(Arc::new(AnthropicClient::new(key.clone(), config)?));
    }

    if let Some(key) = &credentials.openai_api_key {
        let mut config = match &settings.model {
            Some(model) => OpenAiConfig::with_model(model),
            None => OpenAiConfig::default(),
        };
        config.max_tokens = settings.max_tokens;
        config.timeout = Duration::from_millis(settings.timeout_ms);

        log::info!("Selected OpenAI backend, model {}", config.model);
        return Ok(Arc::new(OpenAiClient::new(key.clone(), config)?));
    }

    Err(LlmError::MissingCredentials)
}
