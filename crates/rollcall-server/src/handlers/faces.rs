//! Reference-photo endpoints used by the in-browser face matcher.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students_data` | Students that have a usable reference image |
//! | `GET`  | `/faces/:file` | Stored image bytes, with a content-hash `ETag` |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use rollcall_core::{
  blob::{BlobStore as _, media_type_for},
  record::FaceLocator,
  store::RecordStore,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{AppState, auth::LecturerSession, blobs::BlobError, error::Error};

/// Strong ETag over the image bytes.
pub fn content_etag(bytes: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

// ─── Students data ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FaceEntry {
  pub matric_no:      String,
  pub name:           String,
  pub courses:        Vec<String>,
  pub face_image_url: String,
}

/// `GET /students_data`
pub async fn students_data<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
) -> Result<Json<Vec<FaceEntry>>, Error>
where
  S: RecordStore + Clone + 'static,
{
  let students = state.store.list_students().await.map_err(Error::store)?;

  let mut entries = Vec::with_capacity(students.len());
  for student in students {
    let Some(locator) = student.face_image.as_deref() else {
      continue;
    };
    let url = match FaceLocator::classify(locator) {
      FaceLocator::Remote(url) => url.to_owned(),
      FaceLocator::Stored(path) => match state.blobs.exists(path).await {
        Ok(true) => format!("/{path}"),
        Ok(false) => {
          tracing::warn!(matric_no = %student.matric_no, locator = %path, "face image missing");
          continue;
        }
        Err(e) => {
          tracing::warn!(error = %e, matric_no = %student.matric_no, "unusable face locator");
          continue;
        }
      },
      FaceLocator::Unknown(other) => {
        tracing::warn!(matric_no = %student.matric_no, locator = %other, "unrecognised face locator");
        continue;
      }
    };

    entries.push(FaceEntry {
      name:           student.display_name().to_owned(),
      matric_no:      student.matric_no,
      courses:        student.courses,
      face_image_url: url,
    });
  }

  Ok(Json(entries))
}

// ─── Serve ────────────────────────────────────────────────────────────────────

/// `GET /faces/:file`
pub async fn serve<S>(
  State(state): State<AppState<S>>,
  _session: LecturerSession,
  Path(file): Path<String>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let locator = format!("faces/{file}");
  let bytes = match state.blobs.read(&locator).await {
    Ok(Some(bytes)) => bytes,
    Ok(None) | Err(BlobError::InvalidLocator(_)) => {
      return Err(Error::NotFound("Image not found.".into()));
    }
    Err(e) => return Err(e.into()),
  };

  let etag = content_etag(&bytes);
  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));

  let cache = (header::CACHE_CONTROL, "private, no-cache".to_owned());
  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag), cache]).into_response());
  }

  let content_type = media_type_for(&locator).unwrap_or("application/octet-stream");
  Ok(
    (
      [(header::CONTENT_TYPE, content_type.to_owned()), (header::ETAG, etag), cache],
      bytes,
    )
      .into_response(),
  )
}
