//! Message lifecycle for one chat
//!
//! At most one ephemeral bot message is on screen per session. Sending a new
//! one deletes the tracked one first; permanent messages are never tracked.
//! Delete failures (already gone, too old) are logged and ignored.

use super::traits::{Transport, TransportError};
use crate::state_machine::{ChatId, Markup, MessageId};

pub struct Messenger<T: Transport> {
    transport: T,
    chat_id: ChatId,
}

impl<T: Transport> Messenger<T> {
    pub fn new(transport: T, chat_id: ChatId) -> Self {
        Self { transport, chat_id }
    }

    /// Replace the tracked ephemeral message with a new one.
    ///
    /// Tracking is cleared before sending, so a failed send leaves nothing
    /// tracked rather than a stale id.
    pub async fn send_ephemeral(
        &self,
        tracked: &mut Option<MessageId>,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError> {
        if let Some(previous) = tracked.take() {
            self.delete_quietly(previous).await;
        }
        let message_id = self.transport.send_message(self.chat_id, text, markup).await?;
        *tracked = Some(message_id);
        Ok(message_id)
    }

    pub async fn send_permanent(
        &self,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError> {
        self.transport.send_message(self.chat_id, text, markup).await
    }

    /// Delete the tracked ephemeral message, if any
    pub async fn retract(&self, tracked: &mut Option<MessageId>) {
        if let Some(message_id) = tracked.take() {
            self.delete_quietly(message_id).await;
        }
    }

    pub async fn delete_quietly(&self, message_id: MessageId) {
        if let Err(e) = self.transport.delete_message(self.chat_id, message_id).await {
            tracing::debug!(
                chat_id = self.chat_id,
                message_id,
                error = %e,
                "Delete failed, ignoring"
            );
        }
    }

    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.transport.answer_callback(callback_id, text).await {
            tracing::debug!(chat_id = self.chat_id, error = %e, "Callback answer failed");
        }
    }
}
