//! Triage domain logic
//!
//! Severity parsing and facility recommendation are pure functions over AI
//! text and static configuration. The advisor wraps the model calls and
//! degrades every failure to a fixed fallback reply.

mod advisor;
mod facility;
mod prompts;
mod severity;

pub use advisor::TriageAdvisor;
pub use facility::build_message;
pub use prompts::SymptomContext;
#[cfg(test)]
pub use prompts::{CHAT_FALLBACK, SUMMARY_FALLBACK};
pub use severity::{extract_urgency, Urgency};
