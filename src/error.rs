//! Error types for the HTTP/WS surface and the completion client.
//!
//! Grading itself never fails. These cover lookups, option validation, and
//! the upstream AI service.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Not found: {0}")]
  NotFound(String),
  #[error("Bad request: {0}")]
  BadRequest(String),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
      AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Failures talking to the completion service. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum AiError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("completion HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("completion returned no text")]
  EmptyCompletion,
}
