//! Bearer-session extractor.
//!
//! Every authenticated handler takes a [`LecturerSession`]. Extraction
//! re-reads the lecturer record and repairs the session's active course, so
//! handlers never see a course the lecturer no longer manages.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use rollcall_core::{record::Lecturer, selection::select_active_course, store::RecordStore};

use crate::{AppState, error::Error};

/// The authenticated lecturer behind a request.
#[derive(Debug, Clone)]
pub struct LecturerSession {
  pub token:         String,
  pub lecturer:      Lecturer,
  /// Already validated against `lecturer.courses`.
  pub active_course: Option<String>,
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<AppState<S>> for LecturerSession
where
  S: RecordStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
    let session = state.sessions.touch(token).await.ok_or(Error::Unauthorized)?;

    let lecturer = match state.store.get_lecturer(&session.lecturer_id).await {
      Ok(Some(lecturer)) => lecturer,
      Ok(None) => {
        tracing::warn!(lecturer_id = %session.lecturer_id, "session for unknown lecturer");
        state.sessions.destroy(token).await;
        return Err(Error::Unauthorized);
      }
      Err(e) => {
        tracing::error!(error = %e, lecturer_id = %session.lecturer_id, "failed to load lecturer");
        state.sessions.destroy(token).await;
        return Err(Error::Unauthorized);
      }
    };

    let active_course =
      select_active_course(&lecturer.courses, session.active_course.as_deref());
    if active_course != session.active_course {
      state.sessions.set_active_course(token, active_course.clone()).await;
    }

    Ok(Self { token: token.to_owned(), lecturer, active_course })
  }
}
