use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use incident_ai::workflows::incident::{
    incident_router, ChatCompletions, IncidentWizardService, SessionRepository,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Wizard API plus the operational endpoints. Expects an `AppState` extension layer.
pub(crate) fn with_incident_routes<R, C>(service: Arc<IncidentWizardService<R, C>>) -> Router
where
    R: SessionRepository + 'static,
    C: ChatCompletions + 'static,
{
    incident_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
