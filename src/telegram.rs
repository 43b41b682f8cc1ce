//! Telegram transport adapter
//!
//! Long-polls the Bot API, decodes each update into a session event and
//! hands it to the session manager. Outbound calls go through
//! [`TelegramClient`], which implements the runtime's `Transport`.

mod api;
mod callback;
pub mod update;

pub use api::TelegramClient;
pub use callback::validate_payloads;

use crate::runtime::{SessionManager, Transport, TransportError};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use update::Update;

/// Pause after a failed poll before trying again
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Source of inbound updates (`getUpdates` in production)
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait up to `poll_timeout` for updates with id >= `offset`
    async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError>;
}

/// Receive updates until `cancel` fires
pub async fn run_polling<S, T>(
    source: &S,
    sessions: &SessionManager<T>,
    poll_timeout: Duration,
    cancel: &CancellationToken,
) where
    S: UpdateSource,
    T: Transport + Clone + 'static,
{
    tracing::info!(poll_timeout_secs = poll_timeout.as_secs(), "Polling for updates");
    let mut offset = 0;

    loop {
        let polled = tokio::select! {
            () = cancel.cancelled() => break,
            polled = source.get_updates(offset, poll_timeout) => polled,
        };

        match polled {
            Ok(updates) => offset = dispatch(updates, sessions, offset).await,
            Err(e) => {
                tracing::warn!(error = %e, "Polling failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(ERROR_BACKOFF) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
}

/// Hand one batch to the sessions and return the next offset. Every update
/// is confirmed, handled or not.
async fn dispatch<T>(updates: Vec<Update>, sessions: &SessionManager<T>, mut offset: i64) -> i64
where
    T: Transport + Clone + 'static,
{
    for raw in updates {
        offset = offset.max(raw.update_id + 1);
        let update_id = raw.update_id;

        let Some((chat_id, event)) = update::decode(raw) else {
            tracing::debug!(update_id, "Ignoring update");
            continue;
        };
        if let Err(e) = sessions.send_event(chat_id, event).await {
            tracing::error!(chat_id, error = %e, "Failed to dispatch update");
        }
    }
    offset
}
