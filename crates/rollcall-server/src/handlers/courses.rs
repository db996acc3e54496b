//! Handlers for the lecturer's managed courses and the active-course switch.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/courses` | |
//! | `POST`   | `/courses` | `{"new_course":"CS101"}`; 409 if already managed |
//! | `DELETE` | `/courses/:code` | 404 if not managed |
//! | `POST`   | `/switch_course` | `{"course":"MTH202"}`; unmanaged codes are ignored |

use axum::{
  Json,
  extract::{Path, State},
};
use rollcall_core::{
  record::normalize_course,
  selection::{select_active_course, switch_course},
  store::RecordStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::LecturerSession, error::Error};

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
  pub status:        &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:       Option<String>,
  pub courses:       Vec<String>,
  pub active_course: Option<String>,
}

/// `GET /courses`
pub async fn list<S>(session: LecturerSession) -> Json<CoursesResponse>
where
  S: RecordStore + Clone + 'static,
{
  Json(CoursesResponse {
    status:        "success",
    message:       None,
    courses:       session.lecturer.courses,
    active_course: session.active_course,
  })
}

// ─── Add / remove ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddBody {
  #[serde(default)]
  pub new_course: String,
}

/// `POST /courses`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Json(body): Json<AddBody>,
) -> Result<Json<CoursesResponse>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = normalize_course(&body.new_course);
  if course.is_empty() {
    return Err(Error::BadRequest("Course code cannot be empty.".into()));
  }

  let mut lecturer = session.lecturer;
  if !lecturer.add_course(&course) {
    return Err(Error::Conflict(format!("Course {course} already exists.")));
  }
  state
    .store
    .set_lecturer_courses(&lecturer.lecturer_id, lecturer.courses.clone())
    .await
    .map_err(Error::store)?;

  let active_course = select_active_course(&lecturer.courses, session.active_course.as_deref());
  state.sessions.set_active_course(&session.token, active_course.clone()).await;

  tracing::info!(lecturer_id = %lecturer.lecturer_id, course = %course, "course added");
  Ok(Json(CoursesResponse {
    status: "success",
    message: Some(format!("Course {course} added.")),
    courses: lecturer.courses,
    active_course,
  }))
}

/// `DELETE /courses/:code`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Path(code): Path<String>,
) -> Result<Json<CoursesResponse>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = normalize_course(&code);
  let mut lecturer = session.lecturer;
  if !lecturer.remove_course(&course) {
    return Err(Error::NotFound(format!("Course {course} not found.")));
  }
  state
    .store
    .set_lecturer_courses(&lecturer.lecturer_id, lecturer.courses.clone())
    .await
    .map_err(Error::store)?;

  let active_course = select_active_course(&lecturer.courses, session.active_course.as_deref());
  state.sessions.set_active_course(&session.token, active_course.clone()).await;

  tracing::info!(lecturer_id = %lecturer.lecturer_id, course = %course, "course removed");
  Ok(Json(CoursesResponse {
    status: "success",
    message: Some(format!("Course {course} removed.")),
    courses: lecturer.courses,
    active_course,
  }))
}

// ─── Switch ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SwitchBody {
  #[serde(default)]
  pub course: String,
}

/// `POST /switch_course`
pub async fn switch<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Json(body): Json<SwitchBody>,
) -> Json<CoursesResponse>
where
  S: RecordStore + Clone + 'static,
{
  let requested = normalize_course(&body.course);
  let active_course = switch_course(
    &session.lecturer.courses,
    &requested,
    session.active_course.as_deref(),
  );
  state.sessions.set_active_course(&session.token, active_course.clone()).await;

  let message = if active_course.as_deref() == Some(requested.as_str()) {
    format!("Switched to {requested}.")
  } else {
    format!("You do not manage {requested}.")
  };
  Json(CoursesResponse {
    status: "success",
    message: Some(message),
    courses: session.lecturer.courses,
    active_course,
  })
}
