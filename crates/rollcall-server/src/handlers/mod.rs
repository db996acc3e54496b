//! Route handlers, one module per resource.

pub mod account;
pub mod attendance;
pub mod courses;
pub mod faces;
pub mod report;
pub mod students;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;

use crate::error::Error;

/// A base64-encoded image carried inside a JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
  pub media_type: String,
  /// Raw base64, or a `data:<type>;base64,` URL as produced by a browser.
  pub data:       String,
}

impl ImageUpload {
  pub fn decode(&self) -> Result<Vec<u8>, Error> {
    let payload = match self.data.split_once(";base64,") {
      Some((_, rest)) => rest,
      None => self.data.as_str(),
    };
    let bytes = B64
      .decode(payload.trim())
      .map_err(|e| Error::BadRequest(format!("face image is not valid base64: {e}")))?;
    if bytes.is_empty() {
      return Err(Error::BadRequest("face image is empty".into()));
    }
    Ok(bytes)
  }
}
