//! Session runtime executor
//!
//! One runtime per chat. It owns the session state, feeds events through the
//! pure transition function and executes the resulting effects in order.

use super::messenger::Messenger;
use super::traits::Transport;
use crate::catalog::Catalog;
use crate::state_machine::{transition, ChatId, Effect, Event, SessionState};
use crate::triage::TriageAdvisor;
use std::sync::Arc;
use tokio::sync::mpsc;

const THINKING_TEXT: &str = "Thinking...";

/// Generic session runtime that can work with any transport implementation
pub struct SessionRuntime<T: Transport + 'static> {
    chat_id: ChatId,
    state: SessionState,
    catalog: Arc<Catalog>,
    advisor: Arc<TriageAdvisor>,
    messenger: Messenger<T>,
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl<T: Transport + 'static> SessionRuntime<T> {
    pub fn new(
        chat_id: ChatId,
        catalog: Arc<Catalog>,
        advisor: Arc<TriageAdvisor>,
        transport: T,
        event_rx: mpsc::UnboundedReceiver<Event>,
    ) -> Self {
        Self {
            chat_id,
            state: SessionState::new(),
            catalog,
            advisor,
            messenger: Messenger::new(transport, chat_id),
            event_rx,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(chat_id = self.chat_id, "Starting session runtime");

        // Events of this chat are handled strictly one after another
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event).await;
        }

        tracing::debug!(chat_id = self.chat_id, "Session runtime stopped");
    }

    pub(crate) async fn process_event(&mut self, event: Event) {
        // Model replies come back as events; loop instead of recursing
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.catalog, current_event);
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        tracing::debug!(chat_id = self.chat_id, phase = ?self.state.phase(), "Event processed");
    }

    /// Execute one effect. Transport failures are logged, never shown to the user.
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SendEphemeral { text, markup } => {
                if let Err(e) = self
                    .messenger
                    .send_ephemeral(
                        &mut self.state.last_ephemeral_message_id,
                        &text,
                        markup.as_ref(),
                    )
                    .await
                {
                    tracing::warn!(chat_id = self.chat_id, error = %e, "Failed to send message");
                }
                None
            }

            Effect::SendPermanent { text, markup } => {
                if let Err(e) = self.messenger.send_permanent(&text, markup.as_ref()).await {
                    tracing::warn!(chat_id = self.chat_id, error = %e, "Failed to send message");
                }
                None
            }

            Effect::DeleteMessage { message_id } => {
                self.messenger.delete_quietly(message_id).await;
                None
            }

            Effect::AnswerCallback { callback_id, text } => {
                self.messenger
                    .answer_callback(&callback_id, text.as_deref())
                    .await;
                None
            }

            Effect::RequestSummary { context } => {
                tracing::info!(
                    chat_id = self.chat_id,
                    symptoms = context.symptoms.len(),
                    "Requesting triage summary"
                );
                // Placeholder replaces the last question and goes away with it
                if let Err(e) = self
                    .messenger
                    .send_ephemeral(
                        &mut self.state.last_ephemeral_message_id,
                        THINKING_TEXT,
                        None,
                    )
                    .await
                {
                    tracing::warn!(chat_id = self.chat_id, error = %e, "Failed to send placeholder");
                }

                let text = self.advisor.summarize(&context).await;
                self.messenger
                    .retract(&mut self.state.last_ephemeral_message_id)
                    .await;
                Some(Event::SummaryReady { text })
            }

            Effect::RequestChatReply { text, context } => {
                let placeholder = match self.messenger.send_permanent(THINKING_TEXT, None).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!(chat_id = self.chat_id, error = %e, "Failed to send placeholder");
                        None
                    }
                };

                let reply = self.advisor.chat_reply(&text, &context).await;
                if let Some(id) = placeholder {
                    self.messenger.delete_quietly(id).await;
                }
                Some(Event::ChatReplyReady { text: reply })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::llm::LlmError;
    use crate::runtime::testing::{MockLlm, MockTransport};
    use crate::state_machine::{Action, Command, Markup};
    use crate::triage::{CHAT_FALLBACK, SUMMARY_FALLBACK};
    use std::time::Duration;

    const CHAT: ChatId = 77;

    struct Harness {
        runtime: SessionRuntime<Arc<MockTransport>>,
        transport: Arc<MockTransport>,
        llm: Arc<MockLlm>,
        // Keeps the channel open for the runtime's lifetime
        _event_tx: mpsc::UnboundedSender<Event>,
    }

    fn harness(llm: MockLlm) -> Harness {
        let transport = Arc::new(MockTransport::new());
        let llm = Arc::new(llm);
        let advisor = Arc::new(TriageAdvisor::new(llm.clone(), Duration::from_millis(500)));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let runtime = SessionRuntime::new(
            CHAT,
            Arc::new(fixtures::catalog()),
            advisor,
            transport.clone(),
            event_rx,
        );
        Harness {
            runtime,
            transport,
            llm,
            _event_tx: event_tx,
        }
    }

    fn text(text: &str, message_id: i64) -> Event {
        Event::Text {
            text: text.to_string(),
            message_id,
        }
    }

    fn detail(field_id: &str, value: &str) -> Event {
        Event::Callback {
            callback_id: format!("cb-{field_id}"),
            message_id: None,
            action: Some(Action::Detail {
                symptom: "headache".to_string(),
                field_id: field_id.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn finish() -> Event {
        Event::Command {
            command: Command::Finish,
            message_id: 9,
            first_name: None,
        }
    }

    #[tokio::test]
    async fn test_full_triage_flow() {
        let mut h = harness(MockLlm::replying(
            "Likely tension.\nSeverity: urgent care\nSee someone if it worsens.",
        ));

        h.runtime.process_event(text("Head and Neck", 1)).await;
        h.runtime.process_event(text("headache", 2)).await;
        h.runtime.process_event(detail("duration", "days")).await;
        h.runtime.process_event(detail("intensity", "severe")).await;
        h.runtime.process_event(detail("vision", "no")).await;
        assert_eq!(h.runtime.state().count("headache"), 1);

        h.runtime.process_event(finish()).await;

        let texts = h.transport.sent_texts(CHAT);
        assert_eq!(
            texts,
            vec![
                "Head and Neck: choose a symptom below.",
                "How long has it lasted?",
                "How bad is it?",
                "Any vision changes?",
                "Saved Headache. Choose another symptom or press Finish.",
                "Thinking...",
                "Likely tension.\nSeverity: urgent care\nSee someone if it worsens.",
                texts[7].as_str(),
            ]
        );
        assert!(texts[7].contains("Center City Urgent Care"));
        assert!(texts[7].ends_with("call 911."));

        // Summary prompt carried what the user reported
        let prompts = h.llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[\"headache\"]"));
        assert!(prompts[0].contains("\"intensity\":\"severe\""));

        // Session cleared and nothing left tracked
        assert_eq!(h.runtime.state(), &SessionState::new());
    }

    #[tokio::test]
    async fn test_ephemeral_messages_replace_each_other() {
        let mut h = harness(MockLlm::replying("unused"));

        h.runtime.process_event(text("headache", 1)).await;
        h.runtime.process_event(detail("duration", "days")).await;
        h.runtime.process_event(detail("intensity", "mild")).await;

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 3);
        let deleted = h.transport.deleted();
        // Inbound "headache" plus the two replaced questions
        assert_eq!(
            deleted,
            vec![
                (CHAT, 1),
                (CHAT, sent[0].message_id),
                (CHAT, sent[1].message_id)
            ]
        );
        assert_eq!(
            h.runtime.state().last_ephemeral_message_id,
            Some(sent[2].message_id)
        );
    }

    #[tokio::test]
    async fn test_placeholder_replaces_question_and_is_removed() {
        let mut h = harness(MockLlm::replying("Severity: self-care"));

        h.runtime.process_event(text("headache", 1)).await;
        let question = h.transport.sent()[0].message_id;
        h.runtime.process_event(finish()).await;

        let sent = h.transport.sent();
        let placeholder = sent[1].message_id;
        assert_eq!(sent[1].text, "Thinking...");
        let deleted = h.transport.deleted();
        assert!(deleted.contains(&(CHAT, question)));
        assert!(deleted.contains(&(CHAT, placeholder)));
        // Self-care: summary only
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].text, "Severity: self-care");
    }

    #[tokio::test]
    async fn test_failed_summary_still_sends_fallback_and_clears() {
        let mut h = harness(MockLlm::failing(LlmError::Transport("unreachable".to_string())));

        h.runtime.process_event(text("rash", 1)).await;
        h.runtime.process_event(finish()).await;

        let texts = h.transport.sent_texts(CHAT);
        assert_eq!(texts.last().map(String::as_str), Some(SUMMARY_FALLBACK));
        assert_eq!(h.runtime.state(), &SessionState::new());
    }

    #[tokio::test]
    async fn test_free_text_reply_keeps_session() {
        let mut h = harness(MockLlm::replying("Rest and drink water."));

        h.runtime.process_event(text("rash", 1)).await;
        let before = h.runtime.state().clone();
        h.runtime.process_event(text("is this serious?", 2)).await;

        let sent = h.transport.sent();
        let placeholder = &sent[1];
        assert_eq!(placeholder.text, "Thinking...");
        assert_eq!(sent[2].text, "Rest and drink water.");
        assert!(h.transport.deleted().contains(&(CHAT, placeholder.message_id)));
        // Free text itself is kept in the transcript
        assert!(!h.transport.deleted().contains(&(CHAT, 2)));
        assert_eq!(h.runtime.state(), &before);

        let prompts = h.llm.prompts();
        assert!(prompts[0].contains("User message: \"is this serious?\""));
        assert!(prompts[0].contains("Symptoms selected: [\"rash\"]"));
    }

    #[tokio::test]
    async fn test_chat_timeout_falls_back() {
        let mut h = harness(MockLlm::replying("late").with_delay(Duration::from_secs(5)));
        h.runtime.process_event(text("hello", 1)).await;
        assert_eq!(
            h.transport.sent_texts(CHAT).last().map(String::as_str),
            Some(CHAT_FALLBACK)
        );
    }

    #[tokio::test]
    async fn test_malformed_callback_is_acknowledged() {
        let mut h = harness(MockLlm::replying("unused"));
        h.runtime
            .process_event(Event::Callback {
                callback_id: "junk".to_string(),
                message_id: Some(3),
                action: None,
            })
            .await;

        assert_eq!(h.transport.answered(), vec![("junk".to_string(), None)]);
        assert!(h.transport.sent().is_empty());
        assert_eq!(h.runtime.state(), &SessionState::new());
    }

    #[tokio::test]
    async fn test_start_sends_menu_and_reset_clears() {
        let mut h = harness(MockLlm::replying("unused"));

        h.runtime
            .process_event(Event::Command {
                command: Command::Start,
                message_id: 1,
                first_name: Some("Sam".to_string()),
            })
            .await;
        h.runtime.process_event(text("rash", 2)).await;
        h.runtime
            .process_event(Event::Command {
                command: Command::Reset,
                message_id: 3,
                first_name: None,
            })
            .await;

        let sent = h.transport.sent();
        assert!(sent[0].text.starts_with("Hello Sam\n"));
        assert!(matches!(sent[0].markup, Some(Markup::Menu(_))));
        assert_eq!(sent[2].text, "Reset complete. Use /start to begin again.");
        // The greeting is permanent: never deleted
        assert!(!h.transport.deleted().contains(&(CHAT, sent[0].message_id)));
        assert_eq!(h.runtime.state().count("rash"), 0);
        assert_eq!(
            h.runtime.state().last_ephemeral_message_id,
            Some(sent[2].message_id)
        );
    }

    #[tokio::test]
    async fn test_send_failures_do_not_stop_the_session() {
        let transport = Arc::new(MockTransport::new().failing_sends());
        let llm = Arc::new(MockLlm::replying("Severity: ER"));
        let advisor = Arc::new(TriageAdvisor::new(llm, Duration::from_millis(500)));
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut runtime =
            SessionRuntime::new(CHAT, Arc::new(fixtures::catalog()), advisor, transport, rx);

        runtime.process_event(text("rash", 1)).await;
        assert_eq!(runtime.state().count("rash"), 1);
        assert!(runtime.state().last_ephemeral_message_id.is_none());

        runtime.process_event(finish()).await;
        assert_eq!(runtime.state(), &SessionState::new());
    }
}
