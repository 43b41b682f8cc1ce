//! Inline-control payloads and keyboard markup
//!
//! Payload strings are the only place the wire format of a pressed control
//! exists. Three shapes are understood:
//!
//! - `detail|<symptom>|<field_id>|<value>`
//! - `symcat|<symptom>`
//! - `symcat_back`

use crate::catalog::{Catalog, CatalogError, CatalogResult};
use crate::state_machine::{Action, Markup};
use serde_json::{json, Value};

const SEPARATOR: char = '|';
const DETAIL_PREFIX: &str = "detail";
const PICK_PREFIX: &str = "symcat";
const BACK_PAYLOAD: &str = "symcat_back";

/// Telegram rejects `callback_data` longer than this many bytes
pub const MAX_PAYLOAD_BYTES: usize = 64;

pub fn encode(action: &Action) -> String {
    match action {
        Action::Detail {
            symptom,
            field_id,
            value,
        } => format!("{DETAIL_PREFIX}{SEPARATOR}{symptom}{SEPARATOR}{field_id}{SEPARATOR}{value}"),
        Action::PickSymptom { symptom } => format!("{PICK_PREFIX}{SEPARATOR}{symptom}"),
        Action::CategoryBack => BACK_PAYLOAD.to_string(),
    }
}

/// `None` for anything that is not exactly one of the known shapes
pub fn decode(payload: &str) -> Option<Action> {
    if payload == BACK_PAYLOAD {
        return Some(Action::CategoryBack);
    }

    let (prefix, rest) = payload.split_once(SEPARATOR)?;
    match prefix {
        DETAIL_PREFIX => {
            let parts: Vec<&str> = rest.split(SEPARATOR).collect();
            let [symptom, field_id, value] = parts.as_slice() else {
                return None;
            };
            Some(Action::Detail {
                symptom: (*symptom).to_string(),
                field_id: (*field_id).to_string(),
                value: (*value).to_string(),
            })
        }
        PICK_PREFIX => Some(Action::PickSymptom {
            symptom: rest.trim().to_string(),
        }),
        _ => None,
    }
}

/// `reply_markup` object for a message
pub fn reply_markup(markup: &Markup) -> Value {
    match markup {
        Markup::Inline(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            json!({
                                "text": button.label,
                                "callback_data": encode(&button.action),
                            })
                        })
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": keyboard })
        }
        Markup::Menu(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|text| json!({ "text": text })).collect())
                .collect();
            json!({ "keyboard": keyboard, "resize_keyboard": true })
        }
    }
}

/// Check every payload the catalog can produce against the wire format.
///
/// Run once at startup; a catalog that fails here would produce controls
/// Telegram rejects or that decode to the wrong answer.
pub fn validate_payloads(catalog: &Catalog) -> CatalogResult<()> {
    for symptom in catalog.symptoms() {
        check_separator(&symptom.name)?;
        check_length(&symptom.name, "", &encode(&Action::PickSymptom {
            symptom: symptom.name.clone(),
        }))?;

        for step in &symptom.flow {
            check_separator(&step.field_id)?;
            for option in &step.options {
                check_separator(&option.value)?;
                let payload = encode(&Action::Detail {
                    symptom: symptom.name.clone(),
                    field_id: step.field_id.clone(),
                    value: option.value.clone(),
                });
                check_length(&symptom.name, &step.field_id, &payload)?;
            }
        }
    }
    Ok(())
}

fn check_separator(part: &str) -> CatalogResult<()> {
    if part.contains(SEPARATOR) {
        return Err(CatalogError::ReservedCharacter(part.to_string()));
    }
    Ok(())
}

fn check_length(symptom: &str, field_id: &str, payload: &str) -> CatalogResult<()> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(CatalogError::PayloadTooLong {
            symptom: symptom.to_string(),
            field_id: field_id.to_string(),
            len: payload.len(),
            limit: MAX_PAYLOAD_BYTES,
        });
    }
    Ok(())
}
