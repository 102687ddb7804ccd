use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::incident::{ApiError, ValidationErrors, WizardStep};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Api(ApiError),
    Payload(serde_json::Error),
    Incomplete {
        step: WizardStep,
        errors: ValidationErrors,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Api(err) => write!(f, "model error: {}", err),
            AppError::Payload(err) => write!(f, "invalid payload: {}", err),
            AppError::Incomplete { step, errors } => {
                write!(f, "incident incomplete at step {}:", step.number())?;
                for (field, message) in errors {
                    write!(f, " {:?}: {};", field, message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Payload(err) => Some(err),
            AppError::Incomplete { .. } => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Payload(_) => StatusCode::BAD_REQUEST,
            AppError::Incomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Api(err) if err.is_missing_credential() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Api(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Incomplete { step, errors } => Json(json!({
                "error": self.to_string(),
                "step": step,
                "errors": errors,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::incident::FieldName;

    #[test]
    fn missing_credential_maps_to_service_unavailable() {
        let response = AppError::from(ApiError::missing_credential()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn incomplete_incident_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.insert(FieldName::Narrative, "Please describe what happened.".to_string());
        let err = AppError::Incomplete {
            step: WizardStep::Narrative,
            errors,
        };
        assert!(err.to_string().contains("step 3"));
        assert!(err.to_string().contains("Please describe what happened."));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
