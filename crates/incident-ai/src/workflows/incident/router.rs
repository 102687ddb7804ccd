use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::assistant::{ApiError, ChatCompletions};
use super::domain::{
    EvidenceCategory, EvidenceFile, IncidentData, ReportCategory, Severity, JURISDICTIONS,
    PREDEFINED_CHILDREN, PREDEFINED_PARTIES,
};
use super::navigation::NavigationOutcome;
use super::repository::{RepositoryError, SessionId, SessionRepository, WizardSession};
use super::service::{DraftRequest, IncidentWizardService, WizardServiceError};
use super::steps::{step_registry, WizardStep};
use super::store::{FormAction, StoreError};

type SharedService<R, C> = Arc<IncidentWizardService<R, C>>;

/// Router exposing the wizard sessions plus the stateless generation endpoints.
pub fn incident_router<R, C>(service: SharedService<R, C>) -> Router
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    Router::new()
        .route("/api/v1/incidents/options", get(options_handler))
        .route("/api/v1/incidents/sessions", post(start_handler::<R, C>))
        .route(
            "/api/v1/incidents/sessions/:session_id",
            get(session_handler::<R, C>).delete(discard_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/actions",
            post(action_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/next",
            post(next_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/prev",
            post(prev_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/steps/:step",
            post(go_to_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/evidence",
            post(evidence_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/draft",
            post(session_draft_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/modal",
            delete(dismiss_modal_handler::<R, C>),
        )
        .route(
            "/api/v1/incidents/sessions/:session_id/export",
            get(export_handler::<R, C>),
        )
        .route("/api/v1/incidents/report", post(report_handler::<R, C>))
        .route("/api/v1/incidents/draft", post(draft_handler::<R, C>))
        .route(
            "/api/v1/incidents/evidence/analyze",
            post(analyze_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn options_handler() -> Response {
    let payload = json!({
        "steps": step_registry(),
        "parties": PREDEFINED_PARTIES,
        "children": PREDEFINED_CHILDREN,
        "jurisdictions": JURISDICTIONS,
        "evidenceCategories": EvidenceCategory::ordered(),
        "reportCategories": ReportCategory::ordered(),
        "severities": Severity::ordered(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn start_handler<R, C>(State(service): State<SharedService<R, C>>) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.start() {
        Ok(session) => session_response(&service, StatusCode::CREATED, session),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn session_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(session) => session_response(&service, StatusCode::OK, session),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn discard_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.discard(&SessionId(session_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn action_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Json(action): Json<FormAction>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.dispatch(&SessionId(session_id), action).await {
        Ok(session) => session_response(&service, StatusCode::OK, session),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn next_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.next(&SessionId(session_id)).await {
        Ok((session, outcome)) => navigation_response(&service, session, outcome),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn prev_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.prev(&SessionId(session_id)).await {
        Ok((session, outcome)) => navigation_response(&service, session, outcome),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn go_to_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path((session_id, step)): Path<(String, u8)>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    let Some(target) = WizardStep::from_number(step) else {
        let payload = json!({ "error": format!("unknown step {step}") });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    };

    match service.go_to(&SessionId(session_id), target).await {
        Ok((session, outcome)) => navigation_response(&service, session, outcome),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evidence_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Json(file): Json<EvidenceFile>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.attach_evidence(&SessionId(session_id), file).await {
        Ok(session) => session_response(&service, StatusCode::OK, session),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn session_draft_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.draft(&SessionId(session_id)).await {
        Ok(draft) => (StatusCode::OK, Json(json!({ "draft": draft }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dismiss_modal_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.dismiss_modal(&SessionId(session_id)).await {
        Ok(session) => session_response(&service, StatusCode::OK, session),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.export_markdown(&SessionId(session_id)) {
        Ok(markdown) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            markdown,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Json(incident): Json<IncidentData>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.generate_report(&incident).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn draft_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Json(request): Json<DraftRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service.generate_draft(&request).await {
        Ok(draft) => (StatusCode::OK, Json(json!({ "draft": draft }))).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeEvidenceRequest {
    file: EvidenceFile,
    #[serde(default)]
    narrative: String,
}

pub(crate) async fn analyze_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Json(request): Json<AnalyzeEvidenceRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    match service
        .analyze_evidence(&request.file, &request.narrative)
        .await
    {
        Ok(analysis) => (StatusCode::OK, Json(json!({ "analysis": analysis }))).into_response(),
        Err(err) => error_response(err),
    }
}

fn session_response<R, C>(
    service: &IncidentWizardService<R, C>,
    status: StatusCode,
    session: WizardSession,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    (status, Json(service.view(session))).into_response()
}

fn navigation_response<R, C>(
    service: &IncidentWizardService<R, C>,
    session: WizardSession,
    outcome: NavigationOutcome,
) -> Response
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    let payload = json!({
        "navigation": outcome,
        "session": service.view(session),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

/// Status for a model failure: missing key is a deployment problem, timeouts are reported
/// separately from other upstream failures.
pub(crate) fn api_error_status(err: &ApiError) -> StatusCode {
    if err.is_missing_credential() {
        StatusCode::SERVICE_UNAVAILABLE
    } else if err.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn error_response(err: WizardServiceError) -> Response {
    let (status, payload) = match &err {
        WizardServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": "session not found" }))
        }
        WizardServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        WizardServiceError::Repository(RepositoryError::Unavailable(_)) => {
            error!(error = %err, "session store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": err.to_string() }),
            )
        }
        WizardServiceError::Store(StoreError::EvidenceNotFound(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": err.to_string() }),
        ),
        WizardServiceError::Api(api) => (
            api_error_status(api),
            json!({
                "error": api.message(),
                "retryable": api.is_retryable(),
            }),
        ),
        WizardServiceError::ReportMissing | WizardServiceError::GenerationInFlight => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        WizardServiceError::Incomplete { step, errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": err.to_string(),
                "step": step,
                "errors": errors,
            }),
        ),
    };
    (status, Json(payload)).into_response()
}
