//! Model gateway layer.
//!
//! This module provides:
//! - Message types for model calls
//! - ModelClient trait for backend abstraction
//! - Anthropic and OpenAI-compatible backends
//! - Credential-based backend selection

pub mod anthropic;
pub mod client;
pub mod gateway;
pub mod openai;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmError, MockModelClient, ModelClient};
pub use gateway::build_client;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, Usage};
