//! Severity line parsing
//!
//! The model is asked to emit exactly one `Severity:` line. This module maps
//! that line onto the urgency tag driving facility recommendations. It never
//! judges urgency itself.

use std::fmt;

/// Canonical urgency derived from AI text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    /// Self-care or unrecognized text; no facility recommendation
    SelfCare,
    UrgentCare,
    EmergencyRoom,
    TraumaCenter,
    Appointment,
}

impl Urgency {
    pub const ALL: [Urgency; 5] = [
        Urgency::SelfCare,
        Urgency::UrgentCare,
        Urgency::EmergencyRoom,
        Urgency::TraumaCenter,
        Urgency::Appointment,
    ];

    /// Short code used as the facility table key
    pub fn tag(self) -> &'static str {
        match self {
            Urgency::SelfCare => "",
            Urgency::UrgentCare => "urgent",
            Urgency::EmergencyRoom => "er",
            Urgency::TraumaCenter => "trauma",
            Urgency::Appointment => "appointment",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.tag() == tag)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::SelfCare => f.write_str("self-care"),
            other => f.write_str(other.tag()),
        }
    }
}

const SEVERITY_PREFIX: &str = "severity:";

/// Extract the urgency from free AI text.
///
/// Only the first `Severity:` line counts. Checks run top to bottom and the
/// first match wins: "appointment with provider" is tested before the ER
/// checks because "provider" contains "er".
pub fn extract_urgency(ai_text: &str) -> Urgency {
    let Some(value) = severity_value(ai_text) else {
        return Urgency::SelfCare;
    };

    if value.starts_with("appointment with provider") {
        Urgency::Appointment
    } else if value.starts_with("urgent care") {
        Urgency::UrgentCare
    } else if value == "er" || value.contains("emergency room") {
        Urgency::EmergencyRoom
    } else if value.starts_with("trauma center") || value.contains("trauma") {
        Urgency::TraumaCenter
    } else {
        Urgency::SelfCare
    }
}

/// Lower-cased, trimmed text after the colon of the first severity line
fn severity_value(ai_text: &str) -> Option<String> {
    ai_text.lines().find_map(|raw| {
        let line = raw.trim().to_lowercase();
        line.strip_prefix(SEVERITY_PREFIX)
            .map(|rest| rest.trim().to_string())
    })
}
