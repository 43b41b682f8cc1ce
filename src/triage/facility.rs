//! Facility recommendation text

use super::Urgency;
use crate::catalog::FacilityTable;

const SAFETY_NET: &str = "If you ever feel in danger, call 911.";

fn header(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::UrgentCare => {
            "Based on severity, you may need an urgent care clinic. Here are options in Philadelphia:"
        }
        Urgency::EmergencyRoom => {
            "Based on severity, you may need an emergency room. Here are nearby ER options:"
        }
        Urgency::TraumaCenter => {
            "Based on severity, a trauma center may be appropriate. Here are nearby trauma centers:"
        }
        Urgency::Appointment => {
            "Based on severity, you may only need a primary care appointment. Here are some options:"
        }
        Urgency::SelfCare => "",
    }
}

/// Build the facility message for an urgency.
///
/// Returns an empty string when there is nothing to recommend; callers must
/// not send an empty message. Entries keep the table's declared order.
pub fn build_message(urgency: Urgency, table: &FacilityTable) -> String {
    if urgency == Urgency::SelfCare {
        return String::new();
    }
    let facilities = table.get(urgency);
    if facilities.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = facilities
        .iter()
        .map(|place| {
            format!(
                "- {} ({}). Hours: {}\n  Location: {}",
                place.name, place.address, place.hours, place.map_url
            )
        })
        .collect();
    format!("{}\n\n{}\n\n{SAFETY_NET}", header(urgency), lines.join("\n"))
}
