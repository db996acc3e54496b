//! Filesystem [`BlobStore`] for reference face photos.
//!
//! Blobs live flat under `photo_dir` and are addressed by locators of the
//! form `faces/<STEM>.<ext>`, where the stem is the escaped key.

use std::path::PathBuf;

use rollcall_core::blob::{BlobStore, extension_for};
use thiserror::Error;

const LOCATOR_PREFIX: &str = "faces/";
const KNOWN_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

#[derive(Debug, Error)]
pub enum BlobError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),
  #[error("invalid blob locator: {0}")]
  InvalidLocator(String),
}

type Result<T, E = BlobError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

/// Keys become file names. `[A-Za-z0-9-]` is kept; every other byte,
/// including `_` itself, is written as `_XX` so distinct keys never share a
/// file.
fn escape_key(key: &str) -> String {
  let mut stem = String::with_capacity(key.len());
  for byte in key.bytes() {
    if byte.is_ascii_alphanumeric() || byte == b'-' {
      stem.push(char::from(byte));
    } else {
      stem.push('_');
      stem.push_str(&hex::encode_upper([byte]));
    }
  }
  stem
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Map a locator to its file, refusing anything that could leave `root`.
  fn resolve(&self, locator: &str) -> Result<PathBuf> {
    let invalid = || BlobError::InvalidLocator(locator.to_owned());
    let file = locator.strip_prefix(LOCATOR_PREFIX).ok_or_else(invalid)?;
    if file.is_empty()
      || file.starts_with('.')
      || file.contains(['/', '\\'])
      || file.contains("..")
    {
      return Err(invalid());
    }
    Ok(self.root.join(file))
  }
}

impl BlobStore for FsBlobStore {
  type Error = BlobError;

  async fn put(&self, key: &str, media_type: &str, bytes: Vec<u8>) -> Result<String> {
    let ext = extension_for(media_type)
      .ok_or_else(|| BlobError::UnsupportedMediaType(media_type.to_owned()))?;
    let stem = escape_key(key);
    if stem.is_empty() {
      return Err(BlobError::InvalidLocator(key.to_owned()));
    }

    tokio::fs::create_dir_all(&self.root).await?;

    // A replacement with a different format must not leave the old file.
    for other in KNOWN_EXTENSIONS.iter().filter(|e| **e != ext) {
      match tokio::fs::remove_file(self.root.join(format!("{stem}.{other}"))).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
      }
    }

    let file_name = format!("{stem}.{ext}");
    tokio::fs::write(self.root.join(&file_name), bytes).await?;
    tracing::debug!(file = %file_name, "stored face image");
    Ok(format!("{LOCATOR_PREFIX}{file_name}"))
  }

  async fn read(&self, locator: &str) -> Result<Option<Vec<u8>>> {
    let path = self.resolve(locator)?;
    match tokio::fs::read(path).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn exists(&self, locator: &str) -> Result<bool> {
    let path = self.resolve(locator)?;
    Ok(tokio::fs::try_exists(path).await?)
  }

  async fn delete(&self, locator: &str) -> Result<()> {
    let path = self.resolve(locator)?;
    match tokio::fs::remove_file(path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
