//! Local credential service: email/password accounts and signed id tokens.
//!
//! Passwords are hashed with argon2 and stored through the
//! [`RecordStore`]; id tokens are HS256 JWTs whose subject is the lecturer
//! id. Any other identity provider can replace this by implementing
//! [`CredentialService`].

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _, password_hash::SaltString,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use rollcall_core::{
  credentials::{CredentialService, Identity},
  record::Account,
  store::RecordStore,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum CredentialError {
  #[error("invalid email address")]
  InvalidEmail,
  #[error("password shorter than {MIN_PASSWORD_LEN} characters")]
  WeakPassword,
  #[error("email already registered")]
  EmailExists,
  #[error("invalid email or password")]
  InvalidCredentials,
  #[error("invalid or expired id token")]
  InvalidToken,
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error("token signing failed: {0}")]
  Token(#[source] jsonwebtoken::errors::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CredentialError {
  /// Message shown to the person signing in.
  pub fn user_message(&self) -> String {
    match self {
      Self::InvalidEmail => "Please enter a valid email address.".to_owned(),
      Self::WeakPassword => {
        format!("Password is too weak. Must be at least {MIN_PASSWORD_LEN} characters.")
      }
      Self::EmailExists => "This email is already registered.".to_owned(),
      Self::InvalidCredentials => "Invalid email or password.".to_owned(),
      Self::InvalidToken => {
        "Authentication token expired or invalid. Please try logging in again.".to_owned()
      }
      other => other.to_string(),
    }
  }
}

type Result<T, E = CredentialError> = std::result::Result<T, E>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:   String,
  email: String,
  iat:   i64,
  exp:   i64,
}

pub struct LocalCredentials<S> {
  store:    Arc<S>,
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl<S> LocalCredentials<S>
where
  S: RecordStore,
{
  pub fn new(store: Arc<S>, secret: &[u8], ttl: Duration) -> Self {
    Self {
      store,
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      ttl,
    }
  }

  /// Create an account and return an id token for it.
  pub async fn sign_up(&self, email: &str, password: &str) -> Result<String> {
    let email = email.trim();
    if !email.contains('@') {
      return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(CredentialError::WeakPassword);
    }
    if self.find(email).await?.is_some() {
      return Err(CredentialError::EmailExists);
    }

    let password_hash = hash_password(password.to_owned()).await?;
    let account = Account {
      lecturer_id: Uuid::new_v4().simple().to_string(),
      email: email.to_owned(),
      password_hash,
      created_at: Utc::now(),
    };
    self
      .store
      .insert_account(account.clone())
      .await
      .map_err(|e| CredentialError::Store(Box::new(e)))?;

    tracing::info!(lecturer_id = %account.lecturer_id, "account created");
    self.issue(&account.lecturer_id, &account.email, Utc::now())
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<String> {
    let account = self
      .find(email.trim())
      .await?
      .ok_or(CredentialError::InvalidCredentials)?;

    verify_password(password.to_owned(), account.password_hash.clone()).await?;
    self.issue(&account.lecturer_id, &account.email, Utc::now())
  }

  /// Sign an id token as if issued at `issued_at`.
  pub fn issue(&self, lecturer_id: &str, email: &str, issued_at: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
      sub:   lecturer_id.to_owned(),
      email: email.to_owned(),
      iat:   issued_at.timestamp(),
      exp:   (issued_at + self.ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
      .map_err(CredentialError::Token)
  }

  async fn find(&self, email: &str) -> Result<Option<Account>> {
    self
      .store
      .find_account(email)
      .await
      .map_err(|e| CredentialError::Store(Box::new(e)))
  }
}

impl<S> CredentialService for LocalCredentials<S>
where
  S: RecordStore,
{
  type Error = CredentialError;

  async fn verify_token(&self, token: &str) -> Result<Identity> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
      .map_err(|e| {
        tracing::debug!(error = %e, "id token rejected");
        CredentialError::InvalidToken
      })?;
    Ok(Identity { lecturer_id: data.claims.sub, email: data.claims.email })
  }
}

// ─── argon2 ──────────────────────────────────────────────────────────────────

// Both run on the blocking pool.

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| CredentialError::Hash(e.to_string()))
  })
  .await
  .map_err(|e| CredentialError::Hash(e.to_string()))?
}

async fn verify_password(password: String, phc: String) -> Result<()> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&phc).map_err(|e| CredentialError::Hash(e.to_string()))?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| CredentialError::InvalidCredentials)
  })
  .await
  .map_err(|e| CredentialError::Hash(e.to_string()))?
}

#[cfg(test)]
mod tests {
  use rollcall_core::memory::MemoryStore;

  use super::*;

  fn service() -> LocalCredentials<MemoryStore> {
    LocalCredentials::new(
      Arc::new(MemoryStore::new()),
      b"test-secret",
      Duration::hours(1),
    )
  }

  #[tokio::test]
  async fn sign_up_then_sign_in_yield_same_identity() {
    let creds = service();
    let first = creds.sign_up("lecturer@example.com", "secret1").await.unwrap();
    let second = creds.sign_in("Lecturer@Example.com", "secret1").await.unwrap();

    let a = creds.verify_token(&first).await.unwrap();
    let b = creds.verify_token(&second).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.email, "lecturer@example.com");
  }

  #[tokio::test]
  async fn sign_up_validates_input() {
    let creds = service();
    assert!(matches!(
      creds.sign_up("not-an-email", "secret1").await,
      Err(CredentialError::InvalidEmail)
    ));
    assert!(matches!(
      creds.sign_up("a@example.com", "short").await,
      Err(CredentialError::WeakPassword)
    ));

    creds.sign_up("a@example.com", "secret1").await.unwrap();
    let err = creds.sign_up("A@example.com", "secret2").await.unwrap_err();
    assert!(matches!(err, CredentialError::EmailExists));
    assert_eq!(err.user_message(), "This email is already registered.");
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let creds = service();
    creds.sign_up("a@example.com", "secret1").await.unwrap();
    assert!(matches!(
      creds.sign_in("a@example.com", "secret2").await,
      Err(CredentialError::InvalidCredentials)
    ));
    assert!(matches!(
      creds.sign_in("b@example.com", "secret1").await,
      Err(CredentialError::InvalidCredentials)
    ));
  }

  #[tokio::test]
  async fn expired_and_foreign_tokens_are_rejected() {
    let creds = service();
    let stale = creds
      .issue("uid-1", "a@example.com", Utc::now() - Duration::hours(3))
      .unwrap();
    assert!(matches!(
      creds.verify_token(&stale).await,
      Err(CredentialError::InvalidToken)
    ));

    let other = LocalCredentials::new(
      Arc::new(MemoryStore::new()),
      b"another-secret",
      Duration::hours(1),
    );
    let foreign = other.issue("uid-1", "a@example.com", Utc::now()).unwrap();
    assert!(matches!(
      creds.verify_token(&foreign).await,
      Err(CredentialError::InvalidToken)
    ));
  }
}
