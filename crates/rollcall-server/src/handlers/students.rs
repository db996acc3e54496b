//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | |
//! | `POST`   | `/students` | Enrols in the active course unless `course` is given |
//! | `POST`   | `/students/import` | CSV body; optional `?course=` |
//! | `GET`    | `/students/:id` | 404 if not found |
//! | `POST`   | `/students/:id` | Partial update, optional new face image |
//! | `DELETE` | `/students/:id` | Also removes attendance and the stored image |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rollcall_core::{
  Error as CoreError,
  blob::BlobStore as _,
  record::{FaceLocator, Student, normalize_course, normalize_matric_no},
  roster::{NewStudent, RosterEntry, StudentPatch, merge_import},
  store::RecordStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, auth::LecturerSession, error::Error, handlers::ImageUpload};

const ROSTER_COLUMNS: &[&str] = &["Name", "Matric No", "Department", "Level"];

async fn find_student<S>(state: &AppState<S>, id: &str) -> Result<Student, Error>
where
  S: RecordStore + Clone + 'static,
{
  state
    .store
    .get_student(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| CoreError::StudentNotFound(id.to_owned()).into())
}

/// Remove a stored face image; failures are logged and otherwise ignored.
async fn discard_image<S>(state: &AppState<S>, locator: &str)
where
  S: RecordStore + Clone + 'static,
{
  if let FaceLocator::Stored(path) = FaceLocator::classify(locator)
    && let Err(e) = state.blobs.delete(path).await
  {
    tracing::warn!(error = %e, locator = %path, "failed to remove face image");
  }
}

async fn store_image<S>(
  state: &AppState<S>,
  matric_no: &str,
  upload: &ImageUpload,
) -> Result<String, Error>
where
  S: RecordStore + Clone + 'static,
{
  let bytes = upload.decode()?;
  Ok(state.blobs.put(matric_no, &upload.media_type, bytes).await?)
}

// ─── List / get ───────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
) -> Result<Json<Vec<Student>>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let students = state.store.list_students().await.map_err(Error::store)?;
  Ok(Json(students))
}

/// `GET /students/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
  Path(id): Path<String>,
) -> Result<Json<Student>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let student = find_student(&state, &normalize_matric_no(&id)).await?;
  Ok(Json(student))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:       String,
  pub matric_no:  String,
  pub department: String,
  pub level:      String,
  /// Defaults to the session's active course.
  #[serde(default)]
  pub course:     Option<String>,
  #[serde(default)]
  pub face_image: Option<ImageUpload>,
}

/// `POST /students`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = body
    .course
    .filter(|c| !c.trim().is_empty())
    .or(session.active_course)
    .ok_or_else(|| Error::BadRequest("No course selected.".into()))?;

  let mut student = NewStudent {
    name: body.name,
    matric_no: body.matric_no,
    department: body.department,
    level: body.level,
    course,
  }
  .into_student()?;

  if state
    .store
    .get_student(&student.matric_no)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(CoreError::StudentExists(student.matric_no).into());
  }

  if let Some(upload) = &body.face_image {
    student.face_image = Some(store_image(&state, &student.matric_no, upload).await?);
  }

  if let Err(e) = state.store.put_student(student.clone()).await {
    if let Some(locator) = student.face_image.as_deref() {
      discard_image(&state, locator).await;
    }
    return Err(Error::store(e));
  }

  tracing::info!(matric_no = %student.matric_no, "student added");
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub patch:      StudentPatch,
  #[serde(default)]
  pub face_image: Option<ImageUpload>,
}

/// `POST /students/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
  Path(id): Path<String>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Student>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let existing = find_student(&state, &normalize_matric_no(&id)).await?;
  let mut updated = body.patch.apply(&existing);

  let previous = existing.face_image.as_deref();
  let mut stale = None;
  if let Some(upload) = &body.face_image {
    let locator = store_image(&state, &updated.matric_no, upload).await?;
    stale = previous.filter(|old| *old != locator);
    updated.face_image = Some(locator);
  } else if body.patch.delete_face_image {
    stale = previous;
    updated.face_image = None;
  }

  if let Err(e) = state.store.put_student(updated.clone()).await {
    // A freshly written file the record never pointed at would be orphaned.
    if let Some(new) = updated.face_image.as_deref()
      && Some(new) != previous
    {
      discard_image(&state, new).await;
    }
    return Err(Error::store(e));
  }
  if let Some(old) = stale {
    discard_image(&state, old).await;
  }

  tracing::info!(matric_no = %updated.matric_no, "student updated");
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /students/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
  Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let student = find_student(&state, &normalize_matric_no(&id)).await?;

  state
    .store
    .remove_student(&student.matric_no)
    .await
    .map_err(Error::store)?;
  if let Some(locator) = student.face_image.as_deref() {
    discard_image(&state, locator).await;
  }

  tracing::info!(matric_no = %student.matric_no, "student removed");
  Ok(Json(json!({
    "status": "success",
    "message": format!("Student {} deleted.", student.matric_no),
  })))
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  pub course: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
  pub status:   &'static str,
  pub course:   String,
  pub imported: usize,
  pub skipped:  usize,
  pub message:  String,
}

/// `POST /students/import[?course=<code>]`. The body is a CSV sheet with a
/// `Name, Matric No, Department, Level` header row.
pub async fn import<S>(
  State(state): State<AppState<S>>,
  session: LecturerSession,
  Query(params): Query<ImportParams>,
  body: String,
) -> Result<Json<ImportSummary>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let course = params
    .course
    .as_deref()
    .map(normalize_course)
    .filter(|c| !c.is_empty())
    .or(session.active_course)
    .ok_or_else(|| Error::BadRequest("No course selected.".into()))?;

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(body.as_bytes());

  let headers = reader
    .headers()
    .map_err(|e| Error::BadRequest(format!("Unreadable roster file: {e}")))?
    .clone();
  if !ROSTER_COLUMNS.iter().all(|col| headers.iter().any(|h| h == *col)) {
    return Err(Error::BadRequest(format!(
      "Roster must contain the columns: {}.",
      ROSTER_COLUMNS.join(", ")
    )));
  }

  let mut imported = 0;
  let mut skipped = 0;
  for row in reader.deserialize::<RosterEntry>() {
    let entry = match row {
      Ok(entry) if entry.is_complete() => entry,
      Ok(_) => {
        skipped += 1;
        continue;
      }
      Err(e) => {
        tracing::debug!(error = %e, "skipping unreadable roster row");
        skipped += 1;
        continue;
      }
    };

    let key = normalize_matric_no(&entry.matric_no);
    let existing = state.store.get_student(&key).await.map_err(Error::store)?;
    let student = merge_import(existing, &entry, &course);
    state.store.put_student(student).await.map_err(Error::store)?;
    imported += 1;
  }

  tracing::info!(course = %course, imported, skipped, "roster imported");
  Ok(Json(ImportSummary {
    status: "success",
    message: format!("Imported {imported} students into {course}."),
    course,
    imported,
    skipped,
  }))
}
