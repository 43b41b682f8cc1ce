//! Detail-flow navigation
//!
//! A symptom's flow is scanned left to right; the first step whose field is
//! not yet answered is the next question. When nothing is left (or the flow
//! is empty) the symptom is completed and its count goes up by one.

use super::effect::{Button, Effect, Markup};
use super::event::Action;
use super::state::SessionState;
use crate::catalog::{Catalog, ChoiceOption, DetailStep};

/// Outcome of advancing a symptom's flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorResult {
    AskStep {
        symptom: String,
        field_id: String,
        question: String,
        options: Vec<ChoiceOption>,
    },
    Completed {
        symptom: String,
        /// Count after this completion
        #[allow(dead_code)] // Asserted in tests
        count: u32,
    },
}

impl NavigatorResult {
    /// The ephemeral message presenting this result
    pub fn into_effect(self, catalog: &Catalog) -> Effect {
        match self {
            NavigatorResult::AskStep {
                symptom,
                field_id,
                question,
                options,
            } => {
                let rows = options
                    .into_iter()
                    .map(|option| {
                        vec![Button::new(
                            option.label,
                            Action::Detail {
                                symptom: symptom.clone(),
                                field_id: field_id.clone(),
                                value: option.value,
                            },
                        )]
                    })
                    .collect();
                Effect::ephemeral_with(question, Markup::Inline(rows))
            }
            NavigatorResult::Completed { symptom, .. } => {
                let label = catalog
                    .symptom(&symptom)
                    .map_or(symptom.as_str(), |s| s.label.as_str());
                Effect::ephemeral(format!(
                    "Saved {label}. Choose another symptom or press Finish."
                ))
            }
        }
    }
}

/// First unanswered step of the symptom's flow, in declared order
pub fn next_step<'a>(
    state: &SessionState,
    catalog: &'a Catalog,
    symptom: &str,
) -> Option<&'a DetailStep> {
    let definition = catalog.symptom(symptom)?;
    definition
        .flow
        .iter()
        .find(|step| !state.is_answered(symptom, &step.field_id))
}

/// Present the next question for `symptom`, or complete it
pub fn advance(state: &mut SessionState, catalog: &Catalog, symptom: &str) -> NavigatorResult {
    if let Some(step) = next_step(state, catalog, symptom) {
        state.current_symptom = Some(symptom.to_string());
        return NavigatorResult::AskStep {
            symptom: symptom.to_string(),
            field_id: step.field_id.clone(),
            question: step.question.clone(),
            options: step.options.clone(),
        };
    }

    let count = state.symptom_counts.entry(symptom.to_string()).or_insert(0);
    *count += 1;
    let count = *count;
    state.current_symptom = None;
    NavigatorResult::Completed {
        symptom: symptom.to_string(),
        count,
    }
}

/// Store an answer, then move the flow on by one step
pub fn record_answer(
    state: &mut SessionState,
    catalog: &Catalog,
    symptom: &str,
    field_id: &str,
    value: &str,
) -> NavigatorResult {
    state
        .details
        .entry(symptom.to_string())
        .or_default()
        .insert(field_id.to_string(), value.to_string());
    advance(state, catalog, symptom)
}

/// Whether a detail answer may be applied to the session.
///
/// The symptom must be the one in progress, the value must be offered by the
/// step, and the field must be either already answered or the next one asked.
/// This keeps answers a prefix of the declared flow.
pub fn accepts_answer(
    state: &SessionState,
    catalog: &Catalog,
    symptom: &str,
    field_id: &str,
    value: &str,
) -> bool {
    if state.current_symptom.as_deref() != Some(symptom) {
        return false;
    }
    let Some(step) = catalog.symptom(symptom).and_then(|s| s.step(field_id)) else {
        return false;
    };
    if !step.has_value(value) {
        return false;
    }
    state.is_answered(symptom, field_id)
        || next_step(state, catalog, symptom).is_some_and(|next| next.field_id == field_id)
}
