//! Runtime for chat sessions
//!
//! Each chat gets its own session runtime task, created on first contact and
//! fed through its own queue. Events of one chat are serialized; chats never
//! wait on each other. Queues are unbounded so that handing off an update
//! never blocks, however far behind its chat is.

mod executor;
mod messenger;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::catalog::Catalog;
use crate::state_machine::{ChatId, Event};
use crate::triage::TriageAdvisor;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session {0} is not accepting events")]
    SessionClosed(ChatId),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::UnboundedSender<Event>,
}

/// Manager for all session runtimes
pub struct SessionManager<T: Transport + Clone + 'static> {
    catalog: Arc<Catalog>,
    advisor: Arc<TriageAdvisor>,
    transport: T,
    sessions: RwLock<HashMap<ChatId, SessionHandle>>,
}

impl<T: Transport + Clone + 'static> SessionManager<T> {
    pub fn new(catalog: Arc<Catalog>, advisor: Arc<TriageAdvisor>, transport: T) -> Self {
        Self {
            catalog,
            advisor,
            transport,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the runtime for a chat
    pub async fn get_or_create(&self, chat_id: ChatId) -> SessionHandle {
        // Check if already running
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&chat_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another event may have created it while we waited for the lock
        if let Some(handle) = sessions.get(&chat_id) {
            return handle.clone();
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let runtime = SessionRuntime::new(
            chat_id,
            self.catalog.clone(),
            self.advisor.clone(),
            self.transport.clone(),
            event_rx,
        );

        tokio::spawn(async move {
            runtime.run().await;
            tracing::debug!(chat_id, "Session runtime finished");
        });
        tracing::info!(chat_id, "Session created");

        let handle = SessionHandle { event_tx };
        sessions.insert(chat_id, handle.clone());
        handle
    }

    /// Send an event to a chat's session, recreating the runtime once if it
    /// has gone away
    pub async fn send_event(&self, chat_id: ChatId, event: Event) -> Result<(), RuntimeError> {
        let handle = self.get_or_create(chat_id).await;
        let Err(mpsc::error::SendError(event)) = handle.event_tx.send(event) else {
            return Ok(());
        };

        tracing::warn!(chat_id, "Session runtime gone, recreating");
        self.remove(chat_id).await;
        let handle = self.get_or_create(chat_id).await;
        handle
            .event_tx
            .send(event)
            .map_err(|_| RuntimeError::SessionClosed(chat_id))
    }

    /// Forget a chat's runtime; the next event starts a fresh session
    pub async fn remove(&self, chat_id: ChatId) {
        self.sessions.write().await.remove(&chat_id);
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
