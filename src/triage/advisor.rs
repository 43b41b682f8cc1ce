//! Model calls for the triage summary and free-text chat

use super::prompts::{chat_prompt, summary_prompt, SymptomContext, CHAT_FALLBACK, SUMMARY_FALLBACK};
use crate::llm::{LlmRequest, LlmService};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Replies are asked to stay under 70 words; this leaves headroom
const MAX_REPLY_TOKENS: u32 = 400;

/// Prompt-in, text-out access to the model with fixed fallbacks.
///
/// A single attempt is made per call. Errors, timeouts and empty replies all
/// produce the fallback text so the conversation can continue.
pub struct TriageAdvisor {
    llm: Arc<dyn LlmService>,
    timeout: Duration,
}

impl TriageAdvisor {
    pub fn new(llm: Arc<dyn LlmService>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Summary containing the `Severity:` line
    pub async fn summarize(&self, context: &SymptomContext) -> String {
        self.ask(summary_prompt(context), "summary")
            .await
            .unwrap_or_else(|| SUMMARY_FALLBACK.to_string())
    }

    pub async fn chat_reply(&self, user_text: &str, context: &SymptomContext) -> String {
        self.ask(chat_prompt(user_text, context), "chat")
            .await
            .unwrap_or_else(|| CHAT_FALLBACK.to_string())
    }

    async fn ask(&self, prompt: String, purpose: &'static str) -> Option<String> {
        let request = LlmRequest::user_prompt(prompt, Some(MAX_REPLY_TOKENS));

        match timeout(self.timeout, self.llm.complete(&request)).await {
            Ok(Ok(response)) => {
                let text = response.text.trim();
                if text.is_empty() {
                    tracing::warn!(purpose, "Model returned an empty reply");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(purpose, error = %e, "Model call failed");
                None
            }
            Err(_) => {
                tracing::warn!(purpose, timeout_secs = self.timeout.as_secs(), "Model call timed out");
                None
            }
        }
    }
}
