use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use incident_ai::workflows::incident::{
    EvidenceCategory, EvidenceFile, RepositoryError, SessionId, SessionRepository, WizardSession,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

struct StoredSession {
    session: WizardSession,
    touched: Instant,
}

/// Process-local session store; sessions do not survive a restart and are evicted once idle.
#[derive(Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, StoredSession>>>,
    idle: Duration,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE)
    }
}

impl InMemorySessionRepository {
    pub(crate) fn new(idle: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle,
        }
    }

    /// Lock the map and drop every session idle for longer than the configured window.
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, StoredSession>>, RepositoryError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))?;
        let before = guard.len();
        let idle = self.idle;
        guard.retain(|_, stored| stored.touched.elapsed() <= idle);
        let evicted = before - guard.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle wizard sessions");
        }
        Ok(guard)
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: WizardSession) -> Result<WizardSession, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(
            session.id.clone(),
            StoredSession {
                session: session.clone(),
                touched: Instant::now(),
            },
        );
        Ok(session)
    }

    fn update(&self, session: WizardSession) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard.get_mut(&session.id).ok_or(RepositoryError::NotFound)?;
        stored.session = session;
        stored.touched = Instant::now();
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<WizardSession>, RepositoryError> {
        let mut guard = self.lock()?;
        Ok(guard.get_mut(id).map(|stored| {
            stored.touched = Instant::now();
            stored.session.clone()
        }))
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_category(raw: &str) -> Result<EvidenceCategory, String> {
    EvidenceCategory::ordered()
        .into_iter()
        .find(|category| category.label().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| {
            let known: Vec<&str> = EvidenceCategory::ordered()
                .into_iter()
                .map(EvidenceCategory::label)
                .collect();
            format!("unknown evidence category '{raw}' (expected one of {})", known.join(", "))
        })
}

/// Load a file from disk as an evidence attachment. Only images carry their bytes, since no
/// other strategy sends file contents to the model.
pub(crate) fn load_evidence_file(
    path: &Path,
    mime_override: Option<&str>,
    category: Option<EvidenceCategory>,
    description: Option<String>,
) -> std::io::Result<EvidenceFile> {
    let bytes = std::fs::read(path)?;
    let mime_type = match mime_override {
        Some(value) => value.trim().to_string(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let base64 = mime_type
        .starts_with("image/")
        .then(|| STANDARD.encode(&bytes));

    Ok(EvidenceFile {
        name,
        size: bytes.len() as u64,
        mime_type,
        category,
        description: description.unwrap_or_default(),
        base64,
        ai_analysis: None,
    })
}
