//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the session runtime with mock implementations.

use crate::state_machine::{ChatId, Markup, MessageId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Request never got a usable HTTP response
    #[error("Transport request failed: {0}")]
    Network(String),
    /// The messaging API answered with `ok: false`
    #[error("Transport API error ({code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },
    /// Response body did not have the expected shape
    #[error("Malformed transport response: {0}")]
    Decode(String),
}

/// Outbound side of the messaging platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message and return the id the platform assigned to it
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;

    /// Acknowledge a pressed inline control, optionally with a short toast
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError> {
        (**self).send_message(chat_id, text, markup).await
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        (**self).delete_message(chat_id, message_id).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        (**self).answer_callback(callback_id, text).await
    }
}
