//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docchat_core::AppError;
use serde::Serialize;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::App(AppError::UnsupportedFile(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::App(AppError::Ingest(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::App(AppError::Llm(_)) => StatusCode::BAD_GATEWAY,
            ApiError::App(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::App(err) => match err {
                AppError::Config(_) => "config_error",
                AppError::Io(_) => "io_error",
                AppError::Llm(_) => "llm_error",
                AppError::Knowledge(_) => "knowledge_error",
                AppError::Ingest(_) => "ingest_error",
                AppError::UnsupportedFile(_) => "unsupported_file",
                AppError::Prompt(_) => "prompt_error",
                AppError::Serialization(_) => "serialization_error",
                AppError::Other(_) => "internal_error",
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                msg.clone()
            }
            ApiError::App(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.message());
        }

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}
