//! Effects produced by state transitions

use super::event::{Action, MessageId};
use crate::triage::SymptomContext;

/// One inline control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Controls attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// Buttons under the message, rows in order
    Inline(Vec<Vec<Button>>),
    /// Persistent bottom menu; pressing a key sends its text
    Menu(Vec<Vec<String>>),
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the session's previous ephemeral message with this one
    SendEphemeral {
        text: String,
        markup: Option<Markup>,
    },

    /// Transcript entry; never replaced
    SendPermanent {
        text: String,
        markup: Option<Markup>,
    },

    /// Best-effort delete
    DeleteMessage { message_id: MessageId },

    /// Acknowledge a pressed control, optionally with a toast
    AnswerCallback {
        callback_id: String,
        text: Option<String>,
    },

    /// Ask the model for the triage summary
    RequestSummary { context: SymptomContext },

    /// Forward free text to the model
    RequestChatReply {
        text: String,
        context: SymptomContext,
    },
}

impl Effect {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Effect::SendEphemeral {
            text: text.into(),
            markup: None,
        }
    }

    pub fn ephemeral_with(text: impl Into<String>, markup: Markup) -> Self {
        Effect::SendEphemeral {
            text: text.into(),
            markup: Some(markup),
        }
    }

    pub fn permanent(text: impl Into<String>) -> Self {
        Effect::SendPermanent {
            text: text.into(),
            markup: None,
        }
    }

    pub fn ack(callback_id: impl Into<String>) -> Self {
        Effect::AnswerCallback {
            callback_id: callback_id.into(),
            text: None,
        }
    }

    pub fn delete(message_id: MessageId) -> Self {
        Effect::DeleteMessage { message_id }
    }
}
