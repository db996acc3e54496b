//! The credential-service capability.
//!
//! Lecturers authenticate against an identity provider that issues bearer
//! tokens. The rest of the system only needs to turn a token back into a
//! stable identity; any provider that can do that is substitutable.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// The identity a verified token maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Stable user identifier; used as the lecturer key.
  pub lecturer_id: String,
  pub email:       String,
}

pub trait CredentialService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Verify `token` and return the identity it was issued for.
  fn verify_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + 'a;
}
