//! Model client trait, error taxonomy, and a scripted mock for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::types::{CompletionRequest, CompletionResponse, Usage};

/// Errors that can occur during model operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// No usable credentials for any backend. Raised at gateway
    /// construction, before any round starts.
    #[error("no model credentials found (set ANTHROPIC_API_KEY or OPENAI_API_KEY)")]
    MissingCredentials,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stateless model client - each call is an independent single-turn
/// exchange. A call either succeeds or the failure propagates; no retry
/// or rate-limit handling lives behind this trait.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Single completion request (blocks until the backend answers)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// The model this client talks to
    fn model(&self) -> &str;

    /// Whether the client holds usable credentials
    fn is_ready(&self) -> bool;

    /// Cumulative token usage across all calls on this client
    fn total_usage(&self) -> Usage;
}

/// Scripted model client for tests. Responses are consumed front to back;
/// every request is captured for later assertions.
#[derive(Default)]
pub struct MockModelClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock preloaded with scripted responses
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append a scripted response
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    /// All requests seen so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made against this mock
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);

        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("mock script exhausted".to_string()))?;

        Ok(CompletionResponse {
            content,
            usage: Usage::default(),
        })
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn total_usage(&self) -> Usage {
        Usage::default()
    }
}
