//! Inbound events for a session
//!
//! Transport payloads are decoded into these types once, at the adapter
//! boundary; nothing past that point sees wire strings.

/// Chat/session identifier
pub type ChatId = i64;
/// Transport message identifier
pub type MessageId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Help,
    Finish,
}

/// What a pressed inline control asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Answer to one detail step
    Detail {
        symptom: String,
        field_id: String,
        value: String,
    },
    /// Symptom picked from a category submenu
    PickSymptom { symptom: String },
    /// Close the category submenu
    CategoryBack,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Command {
        command: Command,
        message_id: MessageId,
        first_name: Option<String>,
    },
    Text {
        text: String,
        message_id: MessageId,
    },
    Callback {
        callback_id: String,
        /// Message carrying the pressed control, when the transport knows it
        message_id: Option<MessageId>,
        /// `None` for payloads that could not be decoded
        action: Option<Action>,
    },

    // Model events
    SummaryReady {
        text: String,
    },
    ChatReplyReady {
        text: String,
    },
}
