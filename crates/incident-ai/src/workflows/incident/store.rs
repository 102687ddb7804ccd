use serde::{Deserialize, Serialize};

use super::domain::{
    EvidenceCategory, EvidenceFile, IncidentData, ModalInfo, ReportData, ValidationErrors,
};
use super::steps::WizardStep;

/// Everything one wizard session holds between user actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub incident: IncidentData,
    pub current_step: WizardStep,
    pub errors: ValidationErrors,
    pub modal: Option<ModalInfo>,
    pub report: Option<ReportData>,
    pub draft: Option<String>,
    pub generating: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            incident: IncidentData::default(),
            current_step: WizardStep::FIRST,
            errors: ValidationErrors::new(),
            modal: None,
            report: None,
            draft: None,
            generating: false,
        }
    }
}

/// User-driven mutations of the in-progress incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormAction {
    SetConsent(bool),
    SetDate(String),
    SetTime(String),
    SetNarrative(String),
    SetParties(Vec<String>),
    ToggleParty(String),
    SetChildren(Vec<String>),
    ToggleChild(String),
    SetJurisdiction(String),
    SetCaseNumber(Option<String>),
    AddEvidence(EvidenceFile),
    UpdateEvidence {
        index: usize,
        #[serde(default)]
        category: Option<EvidenceCategory>,
        #[serde(default)]
        description: Option<String>,
    },
    RemoveEvidence {
        index: usize,
    },
    SetModal(Option<ModalInfo>),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no evidence file at position {0}")]
    EvidenceNotFound(usize),
}

impl FormState {
    /// Apply one action. Any change to the incident invalidates a previously generated report
    /// together with its draft.
    pub fn apply(&mut self, action: FormAction) -> Result<(), StoreError> {
        let incident = &mut self.incident;
        let changed = match action {
            FormAction::SetConsent(value) => replace(&mut incident.consent_acknowledged, value),
            FormAction::SetDate(value) => replace(&mut incident.date, value),
            FormAction::SetTime(value) => replace(&mut incident.time, value),
            FormAction::SetNarrative(value) => replace(&mut incident.narrative, value),
            FormAction::SetParties(values) => replace(&mut incident.parties, values),
            FormAction::ToggleParty(value) => toggle(&mut incident.parties, value),
            FormAction::SetChildren(values) => replace(&mut incident.children, values),
            FormAction::ToggleChild(value) => toggle(&mut incident.children, value),
            FormAction::SetJurisdiction(value) => replace(&mut incident.jurisdiction, value),
            FormAction::SetCaseNumber(value) => replace(&mut incident.case_number, value),
            FormAction::AddEvidence(file) => {
                self.add_evidence(file);
                false
            }
            FormAction::UpdateEvidence {
                index,
                category,
                description,
            } => {
                let file = incident
                    .evidence
                    .get_mut(index)
                    .ok_or(StoreError::EvidenceNotFound(index))?;
                let category_changed =
                    category.is_some_and(|category| replace(&mut file.category, Some(category)));
                let description_changed = description
                    .is_some_and(|description| replace(&mut file.description, description));
                category_changed || description_changed
            }
            FormAction::RemoveEvidence { index } => {
                if index >= incident.evidence.len() {
                    return Err(StoreError::EvidenceNotFound(index));
                }
                incident.evidence.remove(index);
                true
            }
            FormAction::SetModal(modal) => {
                self.modal = modal;
                false
            }
            FormAction::Reset => {
                *self = Self::default();
                false
            }
        };

        if changed {
            self.invalidate_report();
        }
        Ok(())
    }

    /// Drop a report built from older incident data. Review is only reachable with a report,
    /// so a session sitting there falls back to the evidence step.
    fn invalidate_report(&mut self) {
        if self.report.take().is_some() {
            self.draft = None;
            if self.current_step == WizardStep::Review {
                self.current_step = WizardStep::Evidence;
            }
        }
    }

    /// Append an evidence file, returning its position.
    pub fn add_evidence(&mut self, mut file: EvidenceFile) -> usize {
        file.ai_analysis = None;
        self.invalidate_report();
        self.incident.evidence.push(file);
        self.incident.evidence.len() - 1
    }

    pub fn set_evidence_analysis(
        &mut self,
        index: usize,
        analysis: String,
    ) -> Result<(), StoreError> {
        let file = self
            .incident
            .evidence
            .get_mut(index)
            .ok_or(StoreError::EvidenceNotFound(index))?;
        file.ai_analysis = Some(analysis);
        Ok(())
    }

    /// Replace the error map from a fresh validation pass.
    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }

    /// True when navigating away would discard entered data.
    pub fn is_dirty(&self) -> bool {
        self.incident.has_user_input() || self.report.is_some()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn toggle(values: &mut Vec<String>, value: String) -> bool {
    if let Some(position) = values.iter().position(|existing| *existing == value) {
        values.remove(position);
    } else {
        values.push(value);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::incident::domain::{FieldName, ModalKind};
    use crate::workflows::incident::tests::common::report_json;
    use serde_json::json;

    fn evidence(name: &str) -> EvidenceFile {
        EvidenceFile {
            name: name.to_string(),
            size: 512,
            mime_type: "image/png".to_string(),
            category: Some(EvidenceCategory::Screenshot),
            ai_analysis: Some("stale".to_string()),
            ..EvidenceFile::default()
        }
    }

    #[test]
    fn starts_clean_on_first_step() {
        let state = FormState::default();
        assert_eq!(state.current_step, WizardStep::Consent);
        assert!(!state.is_dirty());
        assert!(state.modal.is_none());
    }

    #[test]
    fn toggles_parties_on_and_off() {
        let mut state = FormState::default();
        state
            .apply(FormAction::ToggleParty("Grandparent".to_string()))
            .expect("toggle on");
        assert_eq!(state.incident.parties, vec!["Grandparent".to_string()]);
        state
            .apply(FormAction::ToggleParty("Grandparent".to_string()))
            .expect("toggle off");
        assert!(state.incident.parties.is_empty());
    }

    #[test]
    fn added_evidence_drops_client_supplied_analysis() {
        let mut state = FormState::default();
        state
            .apply(FormAction::AddEvidence(evidence("a.png")))
            .expect("add");
        assert!(state.incident.evidence[0].ai_analysis.is_none());
        assert!(state.is_dirty());
    }

    #[test]
    fn updates_and_removes_evidence_by_index() {
        let mut state = FormState::default();
        state.add_evidence(evidence("a.png"));
        state.add_evidence(evidence("b.png"));

        state
            .apply(FormAction::UpdateEvidence {
                index: 1,
                category: Some(EvidenceCategory::Other),
                description: Some("Front door camera".to_string()),
            })
            .expect("update");
        assert_eq!(state.incident.evidence[1].category, Some(EvidenceCategory::Other));
        assert_eq!(state.incident.evidence[1].description, "Front door camera");

        state
            .apply(FormAction::RemoveEvidence { index: 0 })
            .expect("remove");
        assert_eq!(state.incident.evidence.len(), 1);
        assert_eq!(state.incident.evidence[0].name, "b.png");

        assert_eq!(
            state.apply(FormAction::RemoveEvidence { index: 3 }),
            Err(StoreError::EvidenceNotFound(3))
        );
    }

    #[test]
    fn set_errors_replaces_previous_map() {
        let mut state = FormState::default();
        let mut first = ValidationErrors::new();
        first.insert(FieldName::Date, "required".to_string());
        state.set_errors(first);

        let mut second = ValidationErrors::new();
        second.insert(FieldName::Narrative, "required".to_string());
        state.set_errors(second);

        assert!(!state.errors.contains_key(&FieldName::Date));
        assert!(state.errors.contains_key(&FieldName::Narrative));
    }

    #[test]
    fn reset_returns_to_defaults() {
        let mut state = FormState::default();
        state.apply(FormAction::SetConsent(true)).expect("consent");
        state.current_step = WizardStep::Narrative;
        state.modal = Some(ModalInfo::info("Saved", "Draft kept"));
        state.apply(FormAction::Reset).expect("reset");
        assert_eq!(state, FormState::default());
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: FormAction = serde_json::from_value(json!({
            "type": "SET_NARRATIVE",
            "payload": "They arrived an hour late for pickup."
        }))
        .expect("parses");
        assert_eq!(
            action,
            FormAction::SetNarrative("They arrived an hour late for pickup.".to_string())
        );

        let action: FormAction = serde_json::from_value(json!({
            "type": "SET_MODAL",
            "payload": { "title": "Heads up", "message": "Saved", "type": "info" }
        }))
        .expect("parses");
        match action {
            FormAction::SetModal(Some(modal)) => assert_eq!(modal.kind, ModalKind::Info),
            other => panic!("unexpected action {other:?}"),
        }

        let action: FormAction =
            serde_json::from_value(json!({ "type": "RESET" })).expect("unit variant parses");
        assert_eq!(action, FormAction::Reset);
    }

    fn reviewed_state() -> FormState {
        let mut state = FormState::default();
        state.incident.narrative = "Pickup was missed.".to_string();
        state.current_step = WizardStep::Review;
        state.report = Some(serde_json::from_value(report_json()).expect("report"));
        state.draft = Some("Dear [Lawyer's Name],".to_string());
        state
    }

    #[test]
    fn incident_edits_invalidate_the_report() {
        let mut state = reviewed_state();
        state
            .apply(FormAction::SetNarrative("Pickup was missed twice.".to_string()))
            .expect("narrative");

        assert!(state.report.is_none());
        assert!(state.draft.is_none());
        assert_eq!(state.current_step, WizardStep::Evidence);
    }

    #[test]
    fn unchanged_values_and_modals_keep_the_report() {
        let mut state = reviewed_state();
        state
            .apply(FormAction::SetNarrative("Pickup was missed.".to_string()))
            .expect("same narrative");
        state
            .apply(FormAction::SetModal(Some(ModalInfo::info("Saved", "Kept"))))
            .expect("modal");

        assert!(state.report.is_some());
        assert!(state.draft.is_some());
        assert_eq!(state.current_step, WizardStep::Review);
    }

    #[test]
    fn new_evidence_invalidates_the_report() {
        let mut state = reviewed_state();
        state.add_evidence(evidence("late.png"));
        assert!(state.report.is_none());
        assert_eq!(state.current_step, WizardStep::Evidence);
    }
}
