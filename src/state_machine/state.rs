//! Session state types

use super::event::MessageId;
use crate::triage::SymptomContext;
use std::collections::BTreeMap;

/// symptom -> field id -> selected value
pub type DetailMap = BTreeMap<String, BTreeMap<String, String>>;

/// Everything remembered about one chat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Completed flows per symptom; a revisited symptom counts again
    pub symptom_counts: BTreeMap<String, u32>,
    /// Answers are never re-asked within the same session lifetime
    pub details: DetailMap,
    /// Symptom whose flow is mid-way, if any
    pub current_symptom: Option<String>,
    /// Last body system picked from the main menu
    pub current_category: Option<String>,
    /// The one replaceable bot message currently on screen
    pub last_ephemeral_message_id: Option<MessageId>,
}

/// Derived view of where a session is; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    CategorySelected,
    SymptomInProgress,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.current_symptom.is_some() {
            SessionPhase::SymptomInProgress
        } else if self.current_category.is_some() {
            SessionPhase::CategorySelected
        } else {
            SessionPhase::Idle
        }
    }

    /// Answers recorded so far for one symptom
    pub fn answers(&self, symptom: &str) -> Option<&BTreeMap<String, String>> {
        self.details.get(symptom)
    }

    pub fn is_answered(&self, symptom: &str, field_id: &str) -> bool {
        self.answers(symptom)
            .is_some_and(|answers| answers.contains_key(field_id))
    }

    pub fn count(&self, symptom: &str) -> u32 {
        self.symptom_counts.get(symptom).copied().unwrap_or(0)
    }

    /// Snapshot handed to the model; each completion of a symptom is listed
    pub fn symptom_context(&self) -> SymptomContext {
        let symptoms = self
            .symptom_counts
            .iter()
            .flat_map(|(name, count)| std::iter::repeat(name.clone()).take(*count as usize))
            .collect();
        SymptomContext {
            symptoms,
            details: self.details.clone(),
        }
    }
}
