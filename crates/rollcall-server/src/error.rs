//! Error types and axum `IntoResponse` implementation.
//!
//! Every failure is rendered as `{"status":"error","message":...}`, except
//! a missing or stale session, which is a bare 401.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rollcall_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

use crate::{blobs::BlobError, credentials::CredentialError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Record(#[from] CoreError),
  #[error("credential error: {0}")]
  Credentials(#[from] CredentialError),
  #[error("blob store error: {0}")]
  Blob(#[from] BlobError),
  #[error("report error: {0}")]
  Report(#[from] csv::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

fn body(status: StatusCode, message: impl Into<String>) -> Response {
  let message = message.into();
  (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })))
          .into_response()
      }
      Error::Forbidden(msg) => body(StatusCode::FORBIDDEN, msg),
      Error::NotFound(msg) => body(StatusCode::NOT_FOUND, msg),
      Error::Conflict(msg) => body(StatusCode::CONFLICT, msg),
      Error::BadRequest(msg) => body(StatusCode::BAD_REQUEST, msg),
      Error::Record(e) => {
        let status = match &e {
          CoreError::MissingField(_) => StatusCode::BAD_REQUEST,
          CoreError::StudentExists(_) | CoreError::AccountExists(_) => StatusCode::CONFLICT,
          CoreError::StudentNotFound(_) | CoreError::LecturerNotFound(_) => {
            StatusCode::NOT_FOUND
          }
        };
        body(status, e.to_string())
      }
      Error::Credentials(e) => match e {
        CredentialError::Store(_) | CredentialError::Hash(_) | CredentialError::Token(_) => {
          tracing::error!(error = %e, "credential service failure");
          body(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed.")
        }
        CredentialError::InvalidToken | CredentialError::InvalidCredentials => {
          body(StatusCode::UNAUTHORIZED, e.user_message())
        }
        CredentialError::EmailExists => body(StatusCode::CONFLICT, e.user_message()),
        other => body(StatusCode::BAD_REQUEST, other.user_message()),
      },
      Error::Blob(e) => match e {
        BlobError::UnsupportedMediaType(_) | BlobError::InvalidLocator(_) => {
          body(StatusCode::BAD_REQUEST, e.to_string())
        }
        BlobError::Io(_) => {
          tracing::error!(error = %e, "blob store failure");
          body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
      },
      Error::Report(e) => {
        tracing::error!(error = %e, "report rendering failed");
        body(StatusCode::INTERNAL_SERVER_ERROR, "Error generating report.")
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    }
  }
}
