//! Inbound updates from the Bot API
//!
//! Only the fields the bot reads are modelled; everything else in an update
//! is ignored by serde.

use super::callback;
use crate::state_machine::{ChatId, Command, Event, MessageId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Absent when the originating message is too old
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Map an update to the chat it belongs to and a session event.
///
/// Returns `None` for updates the bot does not handle (non-text messages,
/// edits, channel posts and the like).
pub fn decode(update: Update) -> Option<(ChatId, Event)> {
    if let Some(query) = update.callback_query {
        // Private chats share their id with the user
        let chat_id = query
            .message
            .as_ref()
            .map_or(query.from.id, |m| m.chat.id);
        let action = query.data.as_deref().and_then(callback::decode);
        if action.is_none() {
            tracing::debug!(chat_id, data = ?query.data, "Undecodable callback payload");
        }
        return Some((
            chat_id,
            Event::Callback {
                callback_id: query.id,
                message_id: query.message.map(|m| m.message_id),
                action,
            },
        ));
    }

    let message = update.message?;
    let text = message.text?;
    let chat_id = message.chat.id;

    if let Some(command) = parse_command(&text) {
        return Some((
            chat_id,
            Event::Command {
                command,
                message_id: message.message_id,
                first_name: message.from.and_then(|u| u.first_name),
            },
        ));
    }

    Some((
        chat_id,
        Event::Text {
            text,
            message_id: message.message_id,
        },
    ))
}

/// Recognize `/start`, `/reset`, `/help` and `/finish`, also when addressed
/// as `/command@botname`. Arguments after the command are ignored.
fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    match name {
        "start" => Some(Command::Start),
        "reset" => Some(Command::Reset),
        "help" => Some(Command::Help),
        "finish" | "Finish" => Some(Command::Finish),
        _ => None,
    }
}
