//! Model call failures
//!
//! None of these reach the user; the advisor replaces any of them with a
//! fixed reply. The variants only decide what the logs say.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Client setup, connect, timeout or body read
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Non-success HTTP status with the provider's message, if any
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A reply we could not interpret
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Bad key, unknown model or a rejected request body. Every later call
    /// fails the same way until the settings change.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: 400 | 401 | 403 | 404,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("timed out: {e}"))
        } else if e.is_connect() {
            Self::Transport(format!("connection failed: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}
