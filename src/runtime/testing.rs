//! Mock implementations for testing
//!
//! These mocks enable end-to-end session tests without real I/O.

use super::traits::{Transport, TransportError};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::{ChatId, Markup, MessageId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Transport
// ============================================================================

/// A message the mock transport accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    pub markup: Option<Markup>,
}

/// Mock transport recording every call, assigning increasing message ids
pub struct MockTransport {
    next_id: Mutex<MessageId>,
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<(ChatId, MessageId)>>,
    answered: Mutex<Vec<(String, Option<String>)>>,
    fail_sends: bool,
    fail_deletes: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            answered: Mutex::new(Vec::new()),
            fail_sends: false,
            fail_deletes: false,
        }
    }

    /// Every send fails with an API error
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Deletes are recorded, then fail as if the message were already gone
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn answered(&self) -> Vec<(String, Option<String>)> {
        self.answered.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError> {
        if self.fail_sends {
            return Err(TransportError::Api {
                code: Some(403),
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        let message_id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            message_id,
            text: text.to_string(),
            markup: markup.cloned(),
        });
        Ok(message_id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        if self.fail_deletes {
            return Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: message to delete not found".to_string(),
            });
        }
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.answered
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }
}

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock model: queued replies first, then a fixed outcome for every call
pub struct MockLlm {
    queued: Mutex<VecDeque<String>>,
    outcome: Result<String, LlmError>,
    delay: Option<Duration>,
    /// Record of every prompt received
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn replying(text: &str) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            outcome: Ok(text.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::replying("")
        }
    }

    /// Sleep before answering, to exercise timeouts and concurrency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer the next call with `text`
    pub fn queue_reply(&self, text: &str) {
        self.queued.lock().unwrap().push_back(text.to_string());
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(text) = self.queued.lock().unwrap().pop_front() {
            return Ok(LlmResponse::from_text(text));
        }
        self.outcome.clone().map(LlmResponse::from_text)
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
