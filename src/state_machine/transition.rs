//! Pure state transition function
//!
//! Given the same state, catalog and event this always produces the same new
//! state and effects, with no I/O. Every inbound event is handled; malformed
//! ones are acknowledged without touching the session.

use super::effect::{Button, Effect, Markup};
use super::event::{Action, Command, Event, MessageId};
use super::navigator::{accepts_answer, advance, record_answer};
use super::state::SessionState;
use crate::catalog::{Catalog, CategoryDefinition, FINISH_LABEL};
use crate::triage::{build_message, extract_urgency};

const MENU_ROW_WIDTH: usize = 2;
const FINISH_COMMANDS: [&str; 2] = ["/finish", "/Finish"];

const HELP_TEXT: &str =
    "This tool helps you think about symptom urgency. It does not give a medical diagnosis. Use /start to begin.";
const RESET_TEXT: &str = "Reset complete. Use /start to begin again.";
const UNKNOWN_SYMPTOM_TOAST: &str = "Unknown symptom";
const BACK_LABEL: &str = "Back";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function
#[allow(clippy::too_many_lines)]
pub fn transition(state: &SessionState, catalog: &Catalog, event: Event) -> TransitionResult {
    match event {
        // ============================================================
        // Commands
        // ============================================================
        Event::Command {
            command,
            message_id,
            first_name,
        } => match command {
            Command::Start => TransitionResult::new(SessionState::new())
                .with_effect(Effect::SendPermanent {
                    text: greeting(first_name.as_deref()),
                    markup: Some(main_menu(catalog)),
                })
                .with_effect(Effect::delete(message_id)),

            Command::Reset => TransitionResult::new(SessionState::new())
                .with_effect(Effect::ephemeral_with(RESET_TEXT, main_menu(catalog)))
                .with_effect(Effect::delete(message_id)),

            Command::Help => TransitionResult::new(state.clone())
                .with_effect(Effect::ephemeral(HELP_TEXT))
                .with_effect(Effect::delete(message_id)),

            Command::Finish => finish(state, message_id),
        },

        // ============================================================
        // Typed text and bottom-menu keys
        // ============================================================
        Event::Text { text, message_id } => {
            if let Some(category) = catalog.category(&text) {
                let mut new_state = state.clone();
                new_state.current_category = Some(category.name.clone());
                return TransitionResult::new(new_state)
                    .with_effect(Effect::ephemeral_with(
                        format!("{}: choose a symptom below.", category.name),
                        symptom_submenu(catalog, category),
                    ))
                    .with_effect(Effect::delete(message_id));
            }

            if text == FINISH_LABEL || FINISH_COMMANDS.contains(&text.as_str()) {
                return finish(state, message_id);
            }

            if catalog.symptom(&text).is_some() {
                let mut new_state = state.clone();
                let step = advance(&mut new_state, catalog, &text);
                return TransitionResult::new(new_state)
                    .with_effect(step.into_effect(catalog))
                    .with_effect(Effect::delete(message_id));
            }

            TransitionResult::new(state.clone()).with_effect(Effect::RequestChatReply {
                text,
                context: state.symptom_context(),
            })
        }

        // ============================================================
        // Inline controls
        // ============================================================
        Event::Callback {
            callback_id,
            message_id,
            action,
        } => match action {
            Some(Action::Detail {
                symptom,
                field_id,
                value,
            }) if accepts_answer(state, catalog, &symptom, &field_id, &value) => {
                let mut new_state = state.clone();
                let step = record_answer(&mut new_state, catalog, &symptom, &field_id, &value);
                TransitionResult::new(new_state)
                    .with_effect(Effect::ack(callback_id))
                    .with_effect(step.into_effect(catalog))
            }

            Some(Action::PickSymptom { symptom }) => {
                let symptom = symptom.trim();
                if catalog.symptom(symptom).is_none() {
                    return TransitionResult::new(state.clone()).with_effect(
                        Effect::AnswerCallback {
                            callback_id,
                            text: Some(UNKNOWN_SYMPTOM_TOAST.to_string()),
                        },
                    );
                }
                let mut new_state = state.clone();
                let step = advance(&mut new_state, catalog, symptom);
                TransitionResult::new(new_state)
                    .with_effect(Effect::ack(callback_id))
                    .with_effect(step.into_effect(catalog))
            }

            Some(Action::CategoryBack) => close_submenu(state, callback_id, message_id),

            // Undecodable payloads and answers that do not fit the flow
            Some(Action::Detail { .. }) | None => {
                TransitionResult::new(state.clone()).with_effect(Effect::ack(callback_id))
            }
        },

        // ============================================================
        // Model replies
        // ============================================================
        Event::SummaryReady { text } => {
            let urgency = extract_urgency(&text);
            let facilities = build_message(urgency, catalog.facilities());

            // The summary is always sent, facilities only when there are any
            let mut effects = vec![Effect::permanent(text)];
            if !facilities.is_empty() {
                effects.push(Effect::permanent(facilities));
            }
            TransitionResult::new(SessionState::new()).with_effects(effects)
        }

        Event::ChatReplyReady { text } => {
            TransitionResult::new(state.clone()).with_effect(Effect::permanent(text))
        }
    }
}

/// Ask the model for the summary; the session is cleared once it arrives
fn finish(state: &SessionState, message_id: MessageId) -> TransitionResult {
    TransitionResult::new(state.clone())
        .with_effect(Effect::RequestSummary {
            context: state.symptom_context(),
        })
        .with_effect(Effect::delete(message_id))
}

fn close_submenu(
    state: &SessionState,
    callback_id: String,
    message_id: Option<MessageId>,
) -> TransitionResult {
    let mut new_state = state.clone();
    new_state.current_category = None;

    let mut result = TransitionResult::new(new_state);
    if let Some(message_id) = message_id {
        if result.new_state.last_ephemeral_message_id == Some(message_id) {
            result.new_state.last_ephemeral_message_id = None;
        }
        result = result.with_effect(Effect::delete(message_id));
    }
    result.with_effect(Effect::ack(callback_id))
}

fn greeting(first_name: Option<&str>) -> String {
    let hello = match first_name {
        Some(name) if !name.trim().is_empty() => format!("Hello {}", name.trim()),
        _ => "Hello".to_string(),
    };
    format!(
        "{hello}\nFirst choose a body system in the bottom menu. Then pick symptoms. Press Finish when done."
    )
}

/// Bottom menu: categories two per row, then Finish on its own row
pub fn main_menu(catalog: &Catalog) -> Markup {
    let mut rows: Vec<Vec<String>> = catalog
        .categories()
        .chunks(MENU_ROW_WIDTH)
        .map(|chunk| chunk.iter().map(|c| c.name.clone()).collect())
        .collect();
    rows.push(vec![FINISH_LABEL.to_string()]);
    Markup::Menu(rows)
}

/// Symptoms of one category two per row, then Back
pub fn symptom_submenu(catalog: &Catalog, category: &CategoryDefinition) -> Markup {
    let mut rows: Vec<Vec<Button>> = category
        .symptoms
        .chunks(MENU_ROW_WIDTH)
        .map(|chunk| {
            chunk
                .iter()
                .map(|name| {
                    let label = catalog
                        .symptom(name)
                        .map_or(name.as_str(), |s| s.label.as_str());
                    Button::new(
                        label,
                        Action::PickSymptom {
                            symptom: name.clone(),
                        },
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![Button::new(BACK_LABEL, Action::CategoryBack)]);
    Markup::Inline(rows)
}
