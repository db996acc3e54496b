//! Handlers for attendance marking and attendance records.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/stream` | `{"student_id":"S001"}`, marks for the active course |
//! | `GET`    | `/attendance` | Optional `?course=CS101` |
//! | `DELETE` | `/attendance/:student_id/:record_id` | 404 if not found |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rollcall_core::{
  attendance::{Outcome, mark_attendance},
  record::{AttendanceEvent, normalize_course, normalize_matric_no},
  store::RecordStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth::LecturerSession, error::Error};

// ─── Stream ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StreamBody {
  #[serde(default)]
  pub student_id: Option<String>,
}

/// JSON shape returned to the capture page.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StreamResponse {
  pub status:     &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub student_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:       Option<String>,
  pub message:    String,
}

impl From<&Outcome> for StreamResponse {
  fn from(outcome: &Outcome) -> Self {
    Self {
      status:     outcome.status(),
      student_id: outcome.student_id().map(str::to_owned),
      name:       outcome.name().map(str::to_owned),
      message:    outcome.message(),
    }
  }
}

/// `POST /stream`
pub async fn stream<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Json(body): Json<StreamBody>,
) -> impl IntoResponse
where
  S: RecordStore + Clone + 'static,
{
  let student_id = body
    .student_id
    .as_deref()
    .map(normalize_matric_no)
    .unwrap_or_default();

  let outcome = mark_attendance(
    state.store.as_ref(),
    &student_id,
    &session.lecturer.lecturer_id,
    session.active_course.as_deref(),
  )
  .await;

  let status = match &outcome {
    Outcome::Marked { event, .. } => {
      tracing::info!(
        student_id = %event.student_id,
        course = %event.course,
        event_id = %event.event_id,
        lecturer_id = %event.recorded_by,
        "attendance marked"
      );
      StatusCode::OK
    }
    Outcome::StoreError { message } => {
      tracing::error!(
        student_id = %student_id,
        lecturer_id = %session.lecturer.lecturer_id,
        error = %message,
        "attendance store failure"
      );
      StatusCode::INTERNAL_SERVER_ERROR
    }
    other => {
      tracing::debug!(student_id = %student_id, status = other.status(), "attendance not marked");
      StatusCode::OK
    }
  };

  (status, Json(StreamResponse::from(&outcome)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub course: Option<String>,
}

/// Attendance events of one student.
#[derive(Debug, Serialize)]
pub struct StudentAttendance {
  pub student_id: String,
  pub name:       String,
  pub records:    Vec<AttendanceEvent>,
}

/// `GET /attendance[?course=<code>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StudentAttendance>>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = params
    .course
    .as_deref()
    .map(normalize_course)
    .filter(|c| !c.is_empty());

  let events = state.store.list_all_attendance().await.map_err(Error::store)?;
  let names: BTreeMap<String, String> = state
    .store
    .list_students()
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|s| (s.matric_no.clone(), s.display_name().to_owned()))
    .collect();

  let mut grouped: BTreeMap<String, Vec<AttendanceEvent>> = BTreeMap::new();
  for ev in events {
    if course.as_ref().is_some_and(|c| *c != ev.course) {
      continue;
    }
    grouped.entry(ev.student_id.clone()).or_default().push(ev);
  }

  let body = grouped
    .into_iter()
    .map(|(student_id, records)| StudentAttendance {
      name: names.get(&student_id).cloned().unwrap_or_else(|| "Unknown".to_owned()),
      student_id,
      records,
    })
    .collect();
  Ok(Json(body))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /attendance/:student_id/:record_id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Path((student_id, record_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let not_found = || Error::NotFound("Attendance record not found.".into());
  let record_id = Uuid::parse_str(&record_id).map_err(|_| not_found())?;
  let removed = state
    .store
    .remove_attendance(&student_id, record_id)
    .await
    .map_err(Error::store)?;
  if !removed {
    return Err(not_found());
  }

  tracing::info!(
    student_id = %student_id,
    event_id = %record_id,
    lecturer_id = %session.lecturer.lecturer_id,
    "attendance record deleted"
  );
  Ok(Json(json!({ "status": "success", "message": "Attendance record deleted." })))
}
