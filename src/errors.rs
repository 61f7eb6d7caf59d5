use std::fmt;

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors that escape a component boundary.
///
/// Tool failures are not represented here: they are reported as data
/// (`ToolOutput`, `VideoLookup::Failed`) and always reach the client with 200.
#[derive(Debug)]
pub enum AppError {
    /// Invalid environment configuration
    Config(String),
    /// Filesystem failures (uploads, thumbnails, downloads dir)
    FileSystem(std::io::Error),
    /// HTTP client construction failures
    Http(reqwest::Error),
    /// Required form field is absent
    MissingField(&'static str),
    /// Malformed multipart body or body limit exceeded
    Multipart(MultipartError),
    MultipartRejection(MultipartRejection),
    FormRejection(FormRejection),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            AppError::FileSystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Http(e) => write!(f, "HTTP client error: {}", e),
            AppError::MissingField(msg) => write!(f, "{}", msg),
            AppError::Multipart(e) => write!(f, "Invalid multipart body: {}", e),
            AppError::MultipartRejection(e) => write!(f, "Invalid multipart request: {}", e),
            AppError::FormRejection(e) => write!(f, "Invalid form request: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::FileSystem(e) => Some(e),
            AppError::Http(e) => Some(e),
            AppError::Multipart(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        AppError::MultipartRejection(err)
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::FormRejection(err)
    }
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::MultipartRejection(e) => e.status(),
            AppError::FormRejection(e) => e.status(),
            AppError::Config(_) | AppError::FileSystem(_) | AppError::Http(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
