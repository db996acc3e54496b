//! Handlers for accounts and sessions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/sign_up` | `{"email","password"}` → `{"id_token"}` |
//! | `POST` | `/auth/sign_in` | `{"email","password"}` → `{"id_token"}` |
//! | `POST` | `/register` | `{"id_token","courses":"CS101, MTH202"}` |
//! | `POST` | `/login` | `{"id_token"}` |
//! | `POST` | `/logout` | |
//! | `GET`  | `/me` | |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use rollcall_core::{
  credentials::CredentialService as _,
  record::{Lecturer, parse_course_list},
  selection::select_active_course,
  store::RecordStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
  AppState,
  auth::{LecturerSession, bearer_token},
  error::Error,
};

// ─── Credentials ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub id_token: String,
}

/// `POST /auth/sign_up`
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, Error>
where
  S: RecordStore + Clone + 'static,
{
  let id_token = state.credentials.sign_up(&body.email, &body.password).await?;
  Ok((StatusCode::CREATED, Json(TokenResponse { id_token })))
}

/// `POST /auth/sign_in`
pub async fn sign_in<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<Json<TokenResponse>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let id_token = state.credentials.sign_in(&body.email, &body.password).await?;
  Ok(Json(TokenResponse { id_token }))
}

// ─── Register / login ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub id_token: String,
  /// Comma-separated course codes.
  #[serde(default)]
  pub courses:  String,
}

/// `POST /register`
///
/// Creates the lecturer record, or merges `courses` into an existing one,
/// then opens a session.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: RecordStore + Clone + 'static,
{
  let identity = state.credentials.verify_token(&body.id_token).await?;
  let courses = parse_course_list(&body.courses);

  let existing = state
    .store
    .get_lecturer(&identity.lecturer_id)
    .await
    .map_err(Error::store)?;

  let (lecturer, message, status) = match existing {
    Some(mut lecturer) => {
      lecturer.merge_courses(courses);
      (lecturer, "Lecturer account updated with new courses.", StatusCode::OK)
    }
    None => {
      let mut lecturer = Lecturer::new(identity.lecturer_id, identity.email);
      lecturer.merge_courses(courses);
      (lecturer, "Registration successful!", StatusCode::CREATED)
    }
  };

  state
    .store
    .put_lecturer(lecturer.clone())
    .await
    .map_err(Error::store)?;

  let active_course = select_active_course(&lecturer.courses, None);
  let session = state
    .sessions
    .create(&lecturer.lecturer_id, active_course.clone())
    .await;
  tracing::info!(lecturer_id = %lecturer.lecturer_id, "lecturer registered");

  Ok((
    status,
    Json(json!({
      "status": "success",
      "message": message,
      "session": session,
      "active_course": active_course,
    })),
  ))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub id_token: String,
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let identity = state.credentials.verify_token(&body.id_token).await?;

  let lecturer = state
    .store
    .get_lecturer(&identity.lecturer_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      Error::NotFound("Lecturer account not found. Please register first.".into())
    })?;

  let active_course = select_active_course(&lecturer.courses, None);
  let session = state
    .sessions
    .create(&lecturer.lecturer_id, active_course.clone())
    .await;
  tracing::info!(lecturer_id = %lecturer.lecturer_id, "lecturer logged in");

  Ok(Json(json!({
    "status": "success",
    "session": session,
    "active_course": active_course,
  })))
}

/// `POST /logout`: succeeds whether or not the session was still live.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Json<serde_json::Value>
where
  S: RecordStore + Clone + 'static,
{
  if let Some(token) = bearer_token(&headers) {
    state.sessions.destroy(token).await;
  }
  Json(json!({ "status": "success" }))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub lecturer_id:   String,
  pub email:         String,
  pub courses:       Vec<String>,
  pub active_course: Option<String>,
}

/// `GET /me`
pub async fn me<S>(session: LecturerSession) -> Json<MeResponse>
where
  S: RecordStore + Clone + 'static,
{
  Json(MeResponse {
    lecturer_id:   session.lecturer.lecturer_id,
    email:         session.lecturer.email,
    courses:       session.lecturer.courses,
    active_course: session.active_course,
  })
}
