use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as SessionLock, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use super::assistant::{ApiError, ChatCompletions, IncidentAssistant};
use super::domain::{EvidenceFile, IncidentData, ModalInfo, ReportData, ValidationErrors};
use super::navigation::{self, Advance, NavigationOutcome};
use super::repository::{RepositoryError, SessionId, SessionRepository, WizardSession};
use super::steps::WizardStep;
use super::store::{FormAction, FormState, StoreError};
use super::validation::first_invalid_before;

/// Session-scoped wizard operations over a repository and a model transport.
///
/// Every mutating operation holds its session's lock from the first read to the last write, so
/// a write made after awaiting the model never overwrites a concurrent change.
pub struct IncidentWizardService<R, C> {
    repository: Arc<R>,
    assistant: IncidentAssistant<C>,
    today: fn() -> NaiveDate,
    locks: Mutex<HashMap<SessionId, Arc<SessionLock<()>>>>,
}

/// Session ids double as bearer capabilities, so they carry 122 random bits.
fn next_session_id() -> SessionId {
    SessionId(format!("session-{}", Uuid::new_v4().simple()))
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Clears a persisted `generating` flag if the report call is abandoned before it resolves.
struct GeneratingFlag<'a, R: SessionRepository> {
    repository: &'a R,
    id: &'a SessionId,
    armed: bool,
}

impl<R: SessionRepository> GeneratingFlag<'_, R> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<R: SessionRepository> Drop for GeneratingFlag<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(session = %self.id, "report generation abandoned; clearing in-flight flag");
        let cleared = self.repository.fetch(self.id).and_then(|session| match session {
            Some(mut session) => {
                session.state.generating = false;
                self.repository.update(session)
            }
            None => Ok(()),
        });
        if let Err(err) = cleared {
            warn!(session = %self.id, error = %err, "failed to clear in-flight flag");
        }
    }
}

/// What front ends render for a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    #[serde(flatten)]
    pub state: FormState,
    pub can_proceed: bool,
    pub is_dirty: bool,
}

/// Body of a stateless draft request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub professional_summary: String,
    pub legal_insights: String,
    pub incident_date: String,
    #[serde(default)]
    pub case_number: Option<String>,
}

impl<R, C> IncidentWizardService<R, C>
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    pub fn new(repository: Arc<R>, assistant: IncidentAssistant<C>) -> Self {
        Self {
            repository,
            assistant,
            today: local_today,
            locks: Mutex::default(),
        }
    }

    /// Replace the clock used for the future-date rule.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn assistant(&self) -> &IncidentAssistant<C> {
        &self.assistant
    }

    pub fn view(&self, session: WizardSession) -> SessionView {
        let can_proceed = navigation::can_proceed(&session.state, self.today());
        let is_dirty = session.state.is_dirty();
        SessionView {
            id: session.id,
            state: session.state,
            can_proceed,
            is_dirty,
        }
    }

    pub fn start(&self) -> Result<WizardSession, WizardServiceError> {
        let session = WizardSession {
            id: next_session_id(),
            state: FormState::default(),
        };
        let stored = self.repository.insert(session)?;
        info!(session = %stored.id, "wizard session started");
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<WizardSession, WizardServiceError> {
        let session = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    /// Wait for exclusive access to one session. Locks nobody else holds are pruned here, so
    /// the map only tracks sessions with an operation in flight.
    async fn lock_session(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Read the session for an operation that must not interleave with report generation.
    fn get_idle(&self, id: &SessionId) -> Result<WizardSession, WizardServiceError> {
        let session = self.get(id)?;
        if session.state.generating {
            return Err(WizardServiceError::GenerationInFlight);
        }
        Ok(session)
    }

    pub async fn discard(&self, id: &SessionId) -> Result<(), WizardServiceError> {
        let _guard = self.lock_session(id).await;
        self.repository.remove(id)?;
        info!(session = %id, "wizard session discarded");
        Ok(())
    }

    /// Apply a form action and persist the result. Rejected while a report is being generated.
    pub async fn dispatch(
        &self,
        id: &SessionId,
        action: FormAction,
    ) -> Result<WizardSession, WizardServiceError> {
        self.get_idle(id)?;
        let _guard = self.lock_session(id).await;
        let mut session = self.get_idle(id)?;
        session.state.apply(action)?;
        self.repository.update(session.clone())?;
        Ok(session)
    }

    /// Start over. Waits for any in-flight operation instead of rejecting.
    pub async fn reset(&self, id: &SessionId) -> Result<WizardSession, WizardServiceError> {
        let _guard = self.lock_session(id).await;
        let mut session = self.get(id)?;
        session.state.apply(FormAction::Reset)?;
        self.repository.update(session.clone())?;
        Ok(session)
    }

    pub async fn dismiss_modal(&self, id: &SessionId) -> Result<WizardSession, WizardServiceError> {
        let _guard = self.lock_session(id).await;
        let mut session = self.get(id)?;
        session.state.dismiss_modal();
        self.repository.update(session.clone())?;
        Ok(session)
    }

    /// Move forward one step. Leaving the evidence step persists the in-flight flag before
    /// awaiting the report so concurrent callers are turned away instead of queueing a second
    /// generation.
    pub async fn next(
        &self,
        id: &SessionId,
    ) -> Result<(WizardSession, NavigationOutcome), WizardServiceError> {
        self.get_idle(id)?;
        let _guard = self.lock_session(id).await;
        let mut session = self.get_idle(id)?;

        let outcome = match navigation::begin_next(&mut session.state, self.today()) {
            Advance::Done(outcome) => {
                self.repository.update(session.clone())?;
                outcome
            }
            Advance::NeedsReport => {
                self.repository.update(session.clone())?;
                let mut flag = GeneratingFlag {
                    repository: self.repository.as_ref(),
                    id,
                    armed: true,
                };
                let result = self.assistant.generate_report(&session.state.incident).await;
                let outcome = navigation::finish_next(&mut session.state, result);
                self.repository.update(session.clone())?;
                flag.disarm();
                outcome
            }
        };

        info!(session = %session.id, ?outcome, "wizard next");
        Ok((session, outcome))
    }

    pub async fn prev(
        &self,
        id: &SessionId,
    ) -> Result<(WizardSession, NavigationOutcome), WizardServiceError> {
        let _guard = self.lock_session(id).await;
        let mut session = self.get(id)?;
        let outcome = navigation::prev_step(&mut session.state);
        self.repository.update(session.clone())?;
        Ok((session, outcome))
    }

    pub async fn go_to(
        &self,
        id: &SessionId,
        target: WizardStep,
    ) -> Result<(WizardSession, NavigationOutcome), WizardServiceError> {
        let _guard = self.lock_session(id).await;
        let mut session = self.get(id)?;
        let outcome = navigation::go_to_step(&mut session.state, target, self.today());
        self.repository.update(session.clone())?;
        Ok((session, outcome))
    }

    /// Append a file and store its analysis. A failed analysis keeps the file and surfaces an
    /// error modal instead.
    pub async fn attach_evidence(
        &self,
        id: &SessionId,
        file: EvidenceFile,
    ) -> Result<WizardSession, WizardServiceError> {
        self.get_idle(id)?;
        let _guard = self.lock_session(id).await;
        let mut session = self.get_idle(id)?;
        let name = file.name.clone();
        let index = session.state.add_evidence(file);

        let result = self
            .assistant
            .analyze_evidence(
                &session.state.incident.evidence[index],
                &session.state.incident.narrative,
            )
            .await;
        match result {
            Ok(analysis) => session.state.set_evidence_analysis(index, analysis)?,
            Err(err) => {
                warn!(
                    session = %session.id,
                    file = %name,
                    error = %err,
                    "evidence analysis failed"
                );
                session.state.modal = Some(ModalInfo::error(
                    "Evidence Analysis Failed",
                    format!("{name} could not be analyzed: {}", err.message()),
                ));
            }
        }

        self.repository.update(session.clone())?;
        Ok(session)
    }

    /// Draft lawyer correspondence from the session's report and keep it on the session.
    pub async fn draft(&self, id: &SessionId) -> Result<String, WizardServiceError> {
        self.get_idle(id)?;
        let _guard = self.lock_session(id).await;
        let mut session = self.get_idle(id)?;
        let report = session
            .state
            .report
            .as_ref()
            .ok_or(WizardServiceError::ReportMissing)?;

        let draft = self
            .assistant
            .generate_draft(
                &report.professional_summary,
                &report.legal_insights,
                &session.state.incident.date,
                report.case_number.as_deref(),
            )
            .await?;

        session.state.draft = Some(draft.clone());
        self.repository.update(session)?;
        Ok(draft)
    }

    pub fn export_markdown(&self, id: &SessionId) -> Result<String, WizardServiceError> {
        let session = self.get(id)?;
        session
            .state
            .report
            .as_ref()
            .map(ReportData::to_markdown)
            .ok_or(WizardServiceError::ReportMissing)
    }

    /// Generate a report for a complete incident without a session.
    pub async fn generate_report(
        &self,
        incident: &IncidentData,
    ) -> Result<ReportData, WizardServiceError> {
        let today = self.today();
        if let Some((step, errors)) = first_invalid_before(incident, WizardStep::Review, today) {
            return Err(WizardServiceError::Incomplete { step, errors });
        }
        Ok(self.assistant.generate_report(incident).await?)
    }

    pub async fn generate_draft(
        &self,
        request: &DraftRequest,
    ) -> Result<String, WizardServiceError> {
        Ok(self
            .assistant
            .generate_draft(
                &request.professional_summary,
                &request.legal_insights,
                &request.incident_date,
                request.case_number.as_deref(),
            )
            .await?)
    }

    pub async fn analyze_evidence(
        &self,
        file: &EvidenceFile,
        narrative: &str,
    ) -> Result<String, WizardServiceError> {
        Ok(self.assistant.analyze_evidence(file, narrative).await?)
    }
}

/// Error raised by the wizard service.
#[derive(Debug, thiserror::Error)]
pub enum WizardServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no report has been generated for this session")]
    ReportMissing,
    #[error("report generation is already in progress")]
    GenerationInFlight,
    #[error("incident is incomplete at step {}", .step.number())]
    Incomplete {
        step: WizardStep,
        errors: ValidationErrors,
    },
}
