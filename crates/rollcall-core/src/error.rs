//! Error types for `rollcall-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("lecturer not found: {0}")]
  LecturerNotFound(String),

  #[error("Student {0} not found.")]
  StudentNotFound(String),

  #[error("Student {0} already exists.")]
  StudentExists(String),

  #[error("an account for {0} already exists")]
  AccountExists(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
