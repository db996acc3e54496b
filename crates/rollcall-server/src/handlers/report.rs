//! `GET /generate_report/:course`: CSV attendance sheet for one course.

use axum::{
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use rollcall_core::{
  record::normalize_course,
  report::{ReportRow, build_report},
  store::RecordStore,
};

use crate::{AppState, auth::LecturerSession, error::Error};

const HEADER_ROW: &[&str] = &["Name", "Matric No", "Date", "Time", "Course", "Status"];

/// Render report rows as CSV. The header row is written even when there are
/// no rows.
pub fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, Error> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  if rows.is_empty() {
    writer.write_record(HEADER_ROW)?;
  }
  for row in rows {
    writer.serialize(row)?;
  }
  writer
    .into_inner()
    .map_err(|e| Error::Report(csv::Error::from(e.into_error())))
}

pub async fn generate<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Path(course): Path<String>,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = normalize_course(&course);
  if !session.lecturer.manages(&course) {
    return Err(Error::Forbidden("Unauthorized: You do not manage this course.".into()));
  }

  let students = state.store.list_students().await.map_err(Error::store)?;
  let events = state.store.list_all_attendance().await.map_err(Error::store)?;
  let rows = build_report(&course, &students, &events);
  let csv = render_csv(&rows)?;

  let file_name = format!("attendance_{course}_{}.csv", Utc::now().format("%Y-%m-%d"));
  tracing::info!(course = %course, rows = rows.len(), "report generated");

  Ok(
    (
      [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
      ],
      csv,
    )
      .into_response(),
  )
}
