use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::workflows::incident::assistant::{
    ApiError, ChatCompletions, ChatRequest, IncidentAssistant,
};
use crate::workflows::incident::domain::{IncidentData, LEGAL_DISCLAIMER};
use crate::workflows::incident::repository::{
    RepositoryError, SessionId, SessionRepository, WizardSession,
};
use crate::workflows::incident::{incident_router, IncidentWizardService};

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date")
}

pub(crate) fn complete_incident() -> IncidentData {
    IncidentData {
        consent_acknowledged: true,
        date: "2024-01-05".to_string(),
        time: "18:15".to_string(),
        narrative: "The children were returned two hours after the agreed time without notice."
            .to_string(),
        parties: vec!["Ex-spouse/Co-parent".to_string()],
        children: vec!["Child A".to_string()],
        jurisdiction: "Ontario, Canada".to_string(),
        ..IncidentData::default()
    }
}

pub(crate) fn report_json() -> Value {
    json!({
        "title": "Late Return Following Weekend Parenting Time on 2024-01-05",
        "professionalSummary": "Context paragraph.\nChronology paragraph.\nOutcome paragraph.",
        "category": "Parenting Time Violation",
        "severity": "Medium",
        "severityJustification": "A two hour delay disrupted the children's evening routine.",
        "legalInsights": format!("{LEGAL_DISCLAIMER}\nThe Children's Law Reform Act applies."),
        "sources": ["https://www.ontario.ca/laws/statute/90c12"],
        "observedImpact": "The children missed dinner and were visibly tired.",
        "aiNotes": "**Evidence Analysis:**\n- None attached.\n**Evidence Gaps & Recommendations:**\n- Save messages.\n**Communication Strategy:**\n- Stay factual.\n**Documentation Best Practices:**\n- Log times."
    })
}

/// Transport double that replays queued responses and records every request.
#[derive(Default)]
pub(crate) struct ScriptedChat {
    responses: Mutex<VecDeque<Result<String, ApiError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub(crate) fn push_ok(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Ok(content.into()));
    }

    pub(crate) fn push_err(&self, err: ApiError) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ChatCompletions for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::new("no scripted response left")))
    }
}

/// Transport double that parks every call until the test releases it, then answers from a
/// script.
pub(crate) struct GatedChat {
    gate: Semaphore,
    started: AtomicUsize,
    script: ScriptedChat,
}

impl Default for GatedChat {
    fn default() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            script: ScriptedChat::default(),
        }
    }
}

impl GatedChat {
    pub(crate) fn script(&self) -> &ScriptedChat {
        &self.script
    }

    pub(crate) fn release(&self) {
        self.gate.add_permits(1);
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.started() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("model call started");
    }
}

#[async_trait]
impl ChatCompletions for GatedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await.expect("gate open").forget();
        self.script.complete(request).await
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, WizardSession>>>,
}

impl MemoryRepository {
    pub(crate) fn stored(&self, id: &SessionId) -> Option<WizardSession> {
        self.sessions.lock().expect("sessions lock").get(id).cloned()
    }
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: WizardSession) -> Result<WizardSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("sessions lock");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: WizardSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("sessions lock");
        if !guard.contains_key(&session.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<WizardSession>, RepositoryError> {
        Ok(self.sessions.lock().expect("sessions lock").get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.sessions
            .lock()
            .expect("sessions lock")
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

pub(crate) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: WizardSession) -> Result<WizardSession, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn update(&self, _session: WizardSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<WizardSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }
}

pub(crate) type TestService = IncidentWizardService<MemoryRepository, ScriptedChat>;

pub(crate) fn build_service() -> (Arc<TestService>, MemoryRepository, Arc<ScriptedChat>) {
    let repository = MemoryRepository::default();
    let chat = Arc::new(ScriptedChat::default());
    let service = IncidentWizardService::new(
        Arc::new(repository.clone()),
        IncidentAssistant::new(Arc::clone(&chat)),
    )
    .with_clock(today);
    (Arc::new(service), repository, chat)
}

pub(crate) type GatedService = IncidentWizardService<MemoryRepository, GatedChat>;

pub(crate) fn build_gated_service() -> (Arc<GatedService>, MemoryRepository, Arc<GatedChat>) {
    let repository = MemoryRepository::default();
    let chat = Arc::new(GatedChat::default());
    let service = IncidentWizardService::new(
        Arc::new(repository.clone()),
        IncidentAssistant::new(Arc::clone(&chat)),
    )
    .with_clock(today);
    (Arc::new(service), repository, chat)
}

pub(crate) fn router_with_service(service: Arc<TestService>) -> Router {
    incident_router(service)
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(crate) async fn read_text_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
