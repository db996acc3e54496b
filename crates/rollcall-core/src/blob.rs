//! The blob-store capability used for reference face photos.
//!
//! No image bytes live in the record store; a [`Student`](crate::record::Student)
//! only holds the locator returned by [`BlobStore::put`].

use std::future::Future;

/// File extension for an accepted media type.
pub fn extension_for(media_type: &str) -> Option<&'static str> {
  match media_type {
    "image/jpeg" => Some("jpeg"),
    "image/png" => Some("png"),
    _ => None,
  }
}

/// Media type for a stored locator, inferred from its extension.
pub fn media_type_for(locator: &str) -> Option<&'static str> {
  let (_, ext) = locator.rsplit_once('.')?;
  match ext.to_ascii_lowercase().as_str() {
    "jpg" | "jpeg" => Some("image/jpeg"),
    "png" => Some("image/png"),
    _ => None,
  }
}

pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under `key`, replacing any previous blob for the same key,
  /// and return its locator.
  fn put<'a>(
    &'a self,
    key: &'a str,
    media_type: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Read a blob back. Returns `None` if it does not exist.
  fn read<'a>(
    &'a self,
    locator: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;

  fn exists<'a>(
    &'a self,
    locator: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a blob. Deleting a missing blob is not an error.
  fn delete<'a>(
    &'a self,
    locator: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_jpeg_and_png_are_accepted() {
    assert_eq!(extension_for("image/png"), Some("png"));
    assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
    assert_eq!(extension_for("image/gif"), None);
  }

  #[test]
  fn media_type_from_locator() {
    assert_eq!(media_type_for("faces/S001.JPG"), Some("image/jpeg"));
    assert_eq!(media_type_for("faces/S001.png"), Some("image/png"));
    assert_eq!(media_type_for("faces/S001"), None);
  }
}
