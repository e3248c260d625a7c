use crate::models::ErrorResponse;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const MISSING_KEY_MESSAGE: &str = "API-ключ для Gemini не найден на сервере.";
pub const GENERATION_FAILED_MESSAGE: &str = "Не удалось сгенерировать ответ от ИИ.";
pub const INVALID_REQUEST_MESSAGE: &str = "Некорректный запрос.";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("provider API key is not configured")]
    MissingApiKey,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider responded with status {status}")]
    UpstreamStatus { status: reqwest::StatusCode },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("invalid request body: {0}")]
    InvalidRequest(#[from] JsonRejection),
}

impl RelayError {
    /// Machine-readable kind reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::MissingApiKey => "configuration_error",
            RelayError::Transport(_) | RelayError::UpstreamStatus { .. } => "generation_error",
            RelayError::MalformedResponse(_) => "internal_error",
            RelayError::InvalidRequest(_) => "invalid_request",
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            RelayError::MissingApiKey => MISSING_KEY_MESSAGE,
            RelayError::InvalidRequest(_) => INVALID_REQUEST_MESSAGE,
            _ => GENERATION_FAILED_MESSAGE,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        // Provider and configuration failures are 500s; details stay in the server log.
        let body = ErrorResponse {
            error: self.public_message().to_string(),
            code: self.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
