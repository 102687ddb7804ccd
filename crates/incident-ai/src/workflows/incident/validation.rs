use chrono::{NaiveDate, NaiveTime};

use super::domain::{FieldName, IncidentData, ValidationErrors};
use super::steps::WizardStep;

/// Shortest narrative accepted, counted in characters after trimming.
pub const MIN_NARRATIVE_CHARS: usize = 20;

/// Validate the fields owned by `step`. `today` is the submission date used to reject future
/// incident dates; passing it in keeps the check deterministic.
pub fn validate_step(
    incident: &IncidentData,
    step: WizardStep,
    today: NaiveDate,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        WizardStep::Consent => {
            if !incident.consent_acknowledged {
                errors.insert(
                    FieldName::ConsentAcknowledged,
                    "You must acknowledge the disclaimer to continue.".to_string(),
                );
            }
        }
        WizardStep::DateTime => {
            let date = incident.date.trim();
            if date.is_empty() {
                errors.insert(FieldName::Date, "Date is required.".to_string());
            } else {
                match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                    Ok(parsed) if parsed > today => {
                        errors.insert(
                            FieldName::Date,
                            "Date cannot be in the future.".to_string(),
                        );
                    }
                    Ok(_) => {}
                    Err(_) => {
                        errors.insert(
                            FieldName::Date,
                            "Date must use the YYYY-MM-DD format.".to_string(),
                        );
                    }
                }
            }

            let time = incident.time.trim();
            if time.is_empty() {
                errors.insert(FieldName::Time, "Time is required.".to_string());
            } else if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                errors.insert(
                    FieldName::Time,
                    "Time must use the 24-hour HH:MM format.".to_string(),
                );
            }
        }
        WizardStep::Narrative => {
            let narrative = incident.narrative.trim();
            if narrative.is_empty() {
                errors.insert(
                    FieldName::Narrative,
                    "Please describe what happened.".to_string(),
                );
            } else if narrative.chars().count() < MIN_NARRATIVE_CHARS {
                errors.insert(
                    FieldName::Narrative,
                    format!("Please provide at least {MIN_NARRATIVE_CHARS} characters of detail."),
                );
            }
        }
        WizardStep::Involved => {
            if !incident.parties.iter().any(|party| !party.trim().is_empty()) {
                errors.insert(
                    FieldName::Parties,
                    "Select or enter at least one party involved.".to_string(),
                );
            }
        }
        WizardStep::Evidence => {
            let uncategorized: Vec<&str> = incident
                .evidence
                .iter()
                .filter(|file| file.category.is_none())
                .map(|file| file.name.as_str())
                .collect();
            if !uncategorized.is_empty() {
                errors.insert(
                    FieldName::Evidence,
                    format!(
                        "Choose a category for every evidence file: {}.",
                        uncategorized.join(", ")
                    ),
                );
            }
        }
        WizardStep::Review => {}
    }

    errors
}

/// First step before `target` that fails validation, with its errors.
pub fn first_invalid_before(
    incident: &IncidentData,
    target: WizardStep,
    today: NaiveDate,
) -> Option<(WizardStep, ValidationErrors)> {
    target.preceding().find_map(|step| {
        let errors = validate_step(incident, step, today);
        (!errors.is_empty()).then_some((step, errors))
    })
}
