use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionRepository};
use crate::routes::with_incident_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use incident_ai::config::AppConfig;
use incident_ai::error::AppError;
use incident_ai::telemetry;
use incident_ai::workflows::incident::{IncidentAssistant, IncidentWizardService, OpenAiChatClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    let model_configured = config.model.warn_if_unconfigured();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let model = config.model.model.clone();
    let client = OpenAiChatClient::new(config.model)?;
    let service = Arc::new(IncidentWizardService::new(
        Arc::new(InMemorySessionRepository::new(config.server.session_idle)),
        IncidentAssistant::new(Arc::new(client)),
    ));

    let app = with_incident_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %model,
        model_configured,
        "incident intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
