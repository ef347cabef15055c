use serde::Serialize;

/// All lookup errors, categorized by where they surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Provider ──
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ── Input ──
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // ── Configuration ──
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Serializable error value handed back to the host.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::RequestFailed(_) => "REQUEST_FAILED",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::InvalidQuery(_) => "INVALID_QUERY",
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
        };
        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// Allow AppError to cross the host boundary as a structured value.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let response = ErrorResponse::from(self);
        response.serialize(serializer)
    }
}

// ── Conversions from external errors ──

/// Transport faults (DNS, connect, timeout, body read) are reported the same
/// way as a non-success status.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::RequestFailed(status.to_string()),
            None => AppError::RequestFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}
