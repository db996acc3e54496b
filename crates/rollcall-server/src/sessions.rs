//! In-process lecturer sessions.
//!
//! A session binds an opaque bearer token to a lecturer and remembers the
//! course currently being tracked. Sessions expire after an idle period.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore as _};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub lecturer_id:   String,
  pub active_course: Option<String>,
  pub last_seen:     DateTime<Utc>,
}

pub struct SessionStore {
  sessions: RwLock<HashMap<String, Session>>,
  idle_ttl: Duration,
}

impl SessionStore {
  pub fn new(idle_ttl: Duration) -> Self {
    Self { sessions: RwLock::new(HashMap::new()), idle_ttl }
  }

  fn expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(self.idle_ttl) {
      Ok(ttl) => now - session.last_seen > ttl,
      Err(_) => false,
    }
  }

  /// Open a session for `lecturer_id` and return its token.
  pub async fn create(&self, lecturer_id: &str, active_course: Option<String>) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    let session = Session {
      lecturer_id: lecturer_id.to_owned(),
      active_course,
      last_seen: Utc::now(),
    };
    self.sessions.write().await.insert(token.clone(), session);
    token
  }

  /// Look up a live session and refresh its idle timer. Expired sessions are
  /// dropped on access.
  pub async fn touch(&self, token: &str) -> Option<Session> {
    let now = Utc::now();
    let mut sessions = self.sessions.write().await;
    let session = sessions.get_mut(token)?;
    if self.expired(session, now) {
      sessions.remove(token);
      return None;
    }
    session.last_seen = now;
    Some(session.clone())
  }

  /// Returns `false` if the session no longer exists.
  pub async fn set_active_course(&self, token: &str, course: Option<String>) -> bool {
    match self.sessions.write().await.get_mut(token) {
      Some(session) => {
        session.active_course = course;
        true
      }
      None => false,
    }
  }

  pub async fn destroy(&self, token: &str) -> bool {
    self.sessions.write().await.remove(token).is_some()
  }

  /// Drop every expired session; returns how many were removed.
  pub async fn purge_expired(&self) -> usize {
    let now = Utc::now();
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| !self.expired(s, now));
    before - sessions.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn tokens_are_unique_hex() {
    let store = SessionStore::new(Duration::from_secs(60));
    let a = store.create("uid-1", None).await;
    let b = store.create("uid-1", None).await;
    assert_ne!(a, b);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[tokio::test]
  async fn active_course_round_trips() {
    let store = SessionStore::new(Duration::from_secs(60));
    let token = store.create("uid-1", Some("CS101".into())).await;
    assert!(store.set_active_course(&token, Some("MTH202".into())).await);

    let session = store.touch(&token).await.unwrap();
    assert_eq!(session.lecturer_id, "uid-1");
    assert_eq!(session.active_course.as_deref(), Some("MTH202"));
  }

  #[tokio::test]
  async fn destroyed_sessions_are_gone() {
    let store = SessionStore::new(Duration::from_secs(60));
    let token = store.create("uid-1", None).await;
    assert!(store.destroy(&token).await);
    assert!(store.touch(&token).await.is_none());
    assert!(!store.set_active_course(&token, None).await);
  }

  #[tokio::test]
  async fn idle_sessions_expire() {
    let store = SessionStore::new(Duration::ZERO);
    let token = store.create("uid-1", None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(store.touch(&token).await.is_none());
    assert_eq!(store.purge_expired().await, 0);
  }
}
