//! Co-parenting incident wizard: six guarded steps that collect an incident, hand it to a
//! hosted model for a structured report, and export the result.

pub mod assistant;
pub mod domain;
mod export;
pub mod navigation;
pub mod repository;
pub mod router;
pub mod service;
pub mod steps;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use assistant::{
    ApiError, ApiFailure, ChatCompletions, EvidenceStrategy, IncidentAssistant, OpenAiChatClient,
};
pub use domain::{
    EvidenceCategory, EvidenceFile, FieldName, IncidentData, ModalInfo, ModalKind,
    ReportCategory, ReportData, Severity, ValidationErrors, JURISDICTIONS, LEGAL_DISCLAIMER,
    PREDEFINED_CHILDREN, PREDEFINED_PARTIES,
};
pub use navigation::NavigationOutcome;
pub use repository::{RepositoryError, SessionId, SessionRepository, WizardSession};
pub use router::incident_router;
pub use service::{DraftRequest, IncidentWizardService, SessionView, WizardServiceError};
pub use steps::{step_registry, StepDescriptor, WizardStep};
pub use store::{FormAction, FormState, StoreError};
pub use validation::validate_step;
