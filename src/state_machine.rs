//! Per-session conversation state machine
//!
//! Implements the Elm Architecture pattern: a pure transition function maps
//! (state, event) to a new state plus effects. The session runtime executes
//! the effects against the transport and the model.

mod effect;
pub mod event;
pub mod navigator;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Button, Effect, Markup};
pub use event::{Action, ChatId, Command, Event, MessageId};
pub use state::{DetailMap, SessionState};
pub use transition::transition;
