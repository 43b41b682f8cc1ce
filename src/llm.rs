//! Generative model access
//!
//! The triage flow only needs prompt-in, text-out completions. Providers sit
//! behind [`LlmService`] so sessions can be driven by a mock in tests.

mod error;
mod gemini;
mod types;

pub use error::LlmError;
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    fn model_id(&self) -> &str;
}

/// Wraps a provider and logs the outcome of every call
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt_chars: usize = request.messages.iter().map(|m| m.text.len()).sum();
        let start = Instant::now();
        let result = self.inner.complete(request).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) if response.text.trim().is_empty() => {
                tracing::warn!(
                    model = %self.model_id,
                    duration_ms,
                    end_turn = response.end_turn,
                    "Model returned no text"
                );
            }
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms,
                    prompt_chars,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    end_turn = response.end_turn,
                    "Model call completed"
                );
            }
            // Will keep failing until settings change
            Err(e) if e.is_misconfiguration() => {
                tracing::error!(model = %self.model_id, duration_ms, error = %e, "Model rejected the call");
            }
            Err(e) => {
                tracing::warn!(model = %self.model_id, duration_ms, error = %e, "Model call failed");
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
