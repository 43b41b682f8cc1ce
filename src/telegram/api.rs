//! Bot API client

use super::callback::reply_markup;
use super::update::{Message, Update};
use super::UpdateSource;
use crate::runtime::{Transport, TransportError};
use crate::state_machine::{ChatId, Markup, MessageId};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Slack on top of the long-poll window before giving up on `getUpdates`
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram Bot API over HTTPS
pub struct TelegramClient {
    client: Client,
    /// `{base}/bot{token}`; never logged
    endpoint: String,
}

impl TelegramClient {
    /// `base_url` overrides the public endpoint (local Bot API servers)
    pub fn new(token: &str, base_url: Option<&str>) -> Result<Self, TransportError> {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base}/bot{token}"),
        })
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<R, TransportError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // The URL carries the token
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        parse_envelope(&text)
    }
}

/// Every Bot API reply is wrapped as `{ok, result}` or `{ok, error_code, description}`
#[derive(Debug, Deserialize)]
struct Envelope<R> {
    ok: bool,
    result: Option<R>,
    error_code: Option<i64>,
    description: Option<String>,
}

fn parse_envelope<R: DeserializeOwned>(body: &str) -> Result<R, TransportError> {
    let envelope: Envelope<R> =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    if !envelope.ok {
        return Err(TransportError::Api {
            code: envelope.error_code,
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        });
    }
    envelope
        .result
        .ok_or_else(|| TransportError::Decode("ok response without result".to_string()))
}

fn send_message_body(chat_id: ChatId, text: &str, markup: Option<&Markup>) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(markup) = markup {
        body["reply_markup"] = reply_markup(markup);
    }
    body
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageId, TransportError> {
        let body = send_message_body(chat_id, text, markup);
        let message: Message = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(message.message_id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        let body = json!({ "chat_id": chat_id, "message_id": message_id });
        let _: bool = self.call("deleteMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self
            .call("answerCallbackQuery", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body, poll_timeout + POLL_GRACE)
            .await
    }
}
