//! Prompt text for the triage model

use crate::state_machine::DetailMap;

pub const SUMMARY_FALLBACK: &str = "I could not create a summary.";
pub const CHAT_FALLBACK: &str = "I could not respond.";

const SUMMARY_INSTRUCTIONS: &str = r#"Provide a concise, safe triage summary:
- possible explanations (NOT a diagnosis)
- write EXACTLY one line starting with:
  Severity: self-care
  OR
  Severity: urgent care
  OR
  Severity: ER
  OR
  Severity: Trauma center
  OR
  Severity: Appointment with provider
- red flags to watch for
- under 70 words
- no medications
- do not use any "*" when answering
- use common words, less medical terms, make it very easy to comprehend"#;

const CHAT_INSTRUCTIONS: &str = "Reply under 70 words.
Do not diagnose or give medication.
Use simple language.
You may remind the user that this is not medical advice.";

/// Snapshot of what the user has reported so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomContext {
    /// One entry per completed flow; repeats are kept
    pub symptoms: Vec<String>,
    pub details: DetailMap,
}

impl SymptomContext {
    fn symptoms_json(&self) -> String {
        serde_json::to_string(&self.symptoms).unwrap_or_else(|_| "[]".to_string())
    }

    fn details_json(&self) -> String {
        serde_json::to_string(&self.details).unwrap_or_else(|_| "{}".to_string())
    }
}

pub fn summary_prompt(context: &SymptomContext) -> String {
    format!(
        "User symptoms: {}\nSymptom details: {}\n\n{SUMMARY_INSTRUCTIONS}",
        context.symptoms_json(),
        context.details_json()
    )
}

pub fn chat_prompt(user_text: &str, context: &SymptomContext) -> String {
    format!(
        "Context:\nSymptoms selected: {}\nDetails: {}\n\nUser message: \"{user_text}\"\n\n{CHAT_INSTRUCTIONS}",
        context.symptoms_json(),
        context.details_json()
    )
}
