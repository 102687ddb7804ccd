use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentence every legal-insights section must open with. Stripped again before the insights are
/// quoted in a communication draft.
pub const LEGAL_DISCLAIMER: &str = "This is not legal advice and is for informational purposes only. You should consult with a qualified legal professional for advice tailored to your situation.";

pub const PREDEFINED_PARTIES: [&str; 6] = [
    "Ex-spouse/Co-parent",
    "Their current partner",
    "Grandparent",
    "Other family member",
    "Police/First Responder",
    "Witness",
];

pub const PREDEFINED_CHILDREN: [&str; 3] = ["Child A", "Child B", "Child C"];

pub const JURISDICTIONS: [&str; 6] = [
    "Ontario, Canada",
    "British Columbia, Canada",
    "Alberta, Canada",
    "Quebec, Canada",
    "Other Canadian Province",
    "US State - Please specify",
];

/// The user's account of a single incident, collected across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncidentData {
    pub consent_acknowledged: bool,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24 hour clock
    pub time: String,
    pub narrative: String,
    pub parties: Vec<String>,
    pub children: Vec<String>,
    pub jurisdiction: String,
    pub evidence: Vec<EvidenceFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
}

impl IncidentData {
    /// Case number with blank input treated as absent.
    pub fn case_number(&self) -> Option<&str> {
        self.case_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// True once the user has entered anything worth confirming before discarding.
    pub fn has_user_input(&self) -> bool {
        self.consent_acknowledged
            || !self.date.is_empty()
            || !self.time.is_empty()
            || !self.narrative.trim().is_empty()
            || !self.parties.is_empty()
            || !self.children.is_empty()
            || !self.jurisdiction.is_empty()
            || !self.evidence.is_empty()
            || self.case_number().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceCategory {
    Screenshot,
    Document,
    Audio,
    Video,
    Other,
}

impl EvidenceCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Screenshot,
            Self::Document,
            Self::Audio,
            Self::Video,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Screenshot => "Screenshot",
            Self::Document => "Document",
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Other => "Other",
        }
    }
}

/// A file the user attached as evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default)]
    pub category: Option<EvidenceCategory>,
    #[serde(default)]
    pub description: String,
    /// Base64 file contents, only present when the front end uploaded them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

impl EvidenceFile {
    pub fn category_label(&self) -> &'static str {
        self.category.map(EvidenceCategory::label).unwrap_or("Uncategorized")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCategory {
    #[serde(rename = "Child Safety & Welfare")]
    ChildSafetyAndWelfare,
    #[serde(rename = "Communication Breakdown")]
    CommunicationBreakdown,
    #[serde(rename = "Parenting Time Violation")]
    ParentingTimeViolation,
    #[serde(rename = "Breach of Court Order (Non-Time Related)")]
    BreachOfCourtOrder,
    #[serde(rename = "Parental Alienation Tactics")]
    ParentalAlienationTactics,
    #[serde(rename = "Hostile/Disparaging Conduct")]
    HostileOrDisparagingConduct,
    #[serde(rename = "Financial Disputes")]
    FinancialDisputes,
    #[serde(rename = "Medical/Educational Disagreements")]
    MedicalOrEducationalDisagreements,
    #[serde(rename = "Property/Possession Issues")]
    PropertyOrPossessionIssues,
    Other,
}

impl ReportCategory {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::ChildSafetyAndWelfare,
            Self::CommunicationBreakdown,
            Self::ParentingTimeViolation,
            Self::BreachOfCourtOrder,
            Self::ParentalAlienationTactics,
            Self::HostileOrDisparagingConduct,
            Self::FinancialDisputes,
            Self::MedicalOrEducationalDisagreements,
            Self::PropertyOrPossessionIssues,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ChildSafetyAndWelfare => "Child Safety & Welfare",
            Self::CommunicationBreakdown => "Communication Breakdown",
            Self::ParentingTimeViolation => "Parenting Time Violation",
            Self::BreachOfCourtOrder => "Breach of Court Order (Non-Time Related)",
            Self::ParentalAlienationTactics => "Parental Alienation Tactics",
            Self::HostileOrDisparagingConduct => "Hostile/Disparaging Conduct",
            Self::FinancialDisputes => "Financial Disputes",
            Self::MedicalOrEducationalDisagreements => "Medical/Educational Disagreements",
            Self::PropertyOrPossessionIssues => "Property/Possession Issues",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured report returned by the model. Never mutated once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub title: String,
    pub category: ReportCategory,
    pub severity: Severity,
    pub severity_justification: String,
    pub professional_summary: String,
    pub observed_impact: String,
    pub legal_insights: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub ai_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
}

impl ReportData {
    pub fn starts_with_disclaimer(&self) -> bool {
        self.legal_insights.trim_start().starts_with(LEGAL_DISCLAIMER)
    }
}

/// Fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    ConsentAcknowledged,
    Date,
    Time,
    Narrative,
    Parties,
    Children,
    Jurisdiction,
    Evidence,
    CaseNumber,
}

/// Field-level messages from one validation pass. Replaced wholesale on every pass.
pub type ValidationErrors = BTreeMap<FieldName, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    Success,
    Error,
    Info,
}

/// Transient notice shown to the user until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalInfo {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ModalKind,
}

impl ModalInfo {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: ModalKind::Success,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: ModalKind::Error,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: ModalKind::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incident_uses_camel_case_wire_names() {
        let incident = IncidentData {
            consent_acknowledged: true,
            case_number: Some("FC-1".to_string()),
            ..IncidentData::default()
        };
        let value = serde_json::to_value(&incident).expect("serializes");
        assert_eq!(value["consentAcknowledged"], json!(true));
        assert_eq!(value["caseNumber"], json!("FC-1"));
    }

    #[test]
    fn blank_case_number_is_absent() {
        let incident = IncidentData {
            case_number: Some("   ".to_string()),
            ..IncidentData::default()
        };
        assert_eq!(incident.case_number(), None);
        assert!(!incident.has_user_input());
    }

    #[test]
    fn evidence_reads_type_field_as_mime() {
        let file: EvidenceFile = serde_json::from_value(json!({
            "name": "text.png",
            "size": 2048,
            "type": "image/png",
            "category": "Screenshot",
            "description": "Message thread"
        }))
        .expect("deserializes");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.category, Some(EvidenceCategory::Screenshot));
        assert!(file.base64.is_none());
    }

    #[test]
    fn report_category_rejects_unknown_values() {
        let parsed: Result<ReportCategory, _> = serde_json::from_value(json!("Custody Battle"));
        assert!(parsed.is_err());

        let parsed: ReportCategory =
            serde_json::from_value(json!("Breach of Court Order (Non-Time Related)"))
                .expect("known category");
        assert_eq!(parsed, ReportCategory::BreachOfCourtOrder);
    }

    #[test]
    fn category_labels_match_wire_names() {
        for category in ReportCategory::ordered() {
            let wire = serde_json::to_value(category).expect("serializes");
            assert_eq!(wire, json!(category.label()));
        }
    }

    #[test]
    fn modal_kind_serializes_under_type() {
        let modal = ModalInfo::error("Report failed", "try again");
        let value = serde_json::to_value(&modal).expect("serializes");
        assert_eq!(value["type"], json!("error"));
    }
}
