use std::fmt;

/// Failure of any call to the hosted model.
#[derive(Debug, thiserror::Error)]
pub struct ApiError {
    message: String,
    #[source]
    cause: Option<ApiFailure>,
}

/// Underlying reason an [`ApiError`] was raised.
#[derive(Debug, thiserror::Error)]
pub enum ApiFailure {
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredential,
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("model API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("model returned an empty completion")]
    EmptyCompletion,
    #[error("image evidence has no embedded payload")]
    MissingPayload,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: ApiFailure) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn missing_credential() -> Self {
        Self::with_cause(
            "AI service API key not configured; cannot contact the model",
            ApiFailure::MissingCredential,
        )
    }

    /// Classify a reqwest failure, separating timeouts from other transport errors.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::with_cause("the AI service did not respond in time", ApiFailure::Timeout(err))
        } else {
            Self::with_cause("could not reach the AI service", ApiFailure::Transport(err))
        }
    }

    /// Prefix the message with what the caller was doing, keeping the cause.
    pub fn context(mut self, action: &str) -> Self {
        self.message = format!("{action}: {}", self.message);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&ApiFailure> {
        self.cause.as_ref()
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self.cause, Some(ApiFailure::MissingCredential))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, Some(ApiFailure::Timeout(_)))
    }

    /// Whether the same call might succeed if the user tries again. Nothing retries internally.
    pub fn is_retryable(&self) -> bool {
        match &self.cause {
            Some(ApiFailure::Timeout(_)) => true,
            Some(ApiFailure::Transport(err)) => err.is_connect(),
            Some(ApiFailure::Status { status, .. }) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({cause})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_includes_cause() {
        let err = ApiError::with_cause(
            "report generation failed",
            ApiFailure::Status {
                status: 401,
                body: "bad key".to_string(),
            },
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("report generation failed"));
        assert!(rendered.contains("401"));
        assert!(err.source().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        for status in [429, 500, 503] {
            let err = ApiError::with_cause(
                "failed",
                ApiFailure::Status {
                    status,
                    body: String::new(),
                },
            );
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn context_keeps_cause() {
        let err = ApiError::missing_credential().context("Report generation failed");
        assert!(err.message().starts_with("Report generation failed: "));
        assert!(err.is_missing_credential());
        assert!(!err.is_retryable());
    }
}
