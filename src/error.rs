use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::codegen::CodegenError;
use crate::network::ExportError;
use crate::recording::SessionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("A recording session is already active: {0}")]
    SessionAlreadyActive(String),

    #[error("No active recording session")]
    NoActiveSession,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No tab available to record")]
    NoTab,

    #[error("Unsupported target framework: {0}")]
    UnsupportedTarget(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl AppError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::SessionAlreadyActive(_) => (StatusCode::CONFLICT, "Conflict"),
            AppError::NoActiveSession | AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, "Not Found")
            }
            AppError::NoTab
            | AppError::UnsupportedTarget(_)
            | AppError::UnsupportedFormat(_)
            | AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoTab => AppError::NoTab,
            SessionError::AlreadyActive(id) => AppError::SessionAlreadyActive(id),
            SessionError::NoActiveSession => AppError::NoActiveSession,
            SessionError::NotFound(id) => AppError::SessionNotFound(id),
        }
    }
}

impl From<CodegenError> for AppError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::UnsupportedTarget(target) => AppError::UnsupportedTarget(target),
            CodegenError::Write(e) => AppError::Internal(anyhow::anyhow!("script writer failed: {}", e)),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(format) => AppError::UnsupportedFormat(format),
            ExportError::Serialize(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
