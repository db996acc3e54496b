//! HTTP server for rollcall.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`]: lecturer
//! accounts and sessions, the attendance stream endpoint, roster and course
//! management, reference-photo serving, and CSV reports.

pub mod auth;
pub mod blobs;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod sessions;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use rollcall_core::store::RecordStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use blobs::FsBlobStore;
use credentials::LocalCredentials;
use handlers::{account, attendance, courses, faces, report, students};
use sessions::SessionStore;

/// Upper bound on request bodies; face images arrive base64-encoded.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROLLCALL_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_photo_dir")]
  pub photo_dir:           PathBuf,
  /// HS256 key for id tokens.
  pub token_secret:        String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_minutes:   u64,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_minutes: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/rollcall/rollcall.db") }
fn default_photo_dir() -> PathBuf { PathBuf::from("faces") }
fn default_token_ttl() -> u64 { 60 }
fn default_session_ttl() -> u64 { 8 * 60 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store:       Arc<S>,
  pub credentials: Arc<LocalCredentials<S>>,
  pub blobs:       Arc<FsBlobStore>,
  pub sessions:    Arc<SessionStore>,
  pub config:      Arc<ServerConfig>,
}

impl<S> AppState<S>
where
  S: RecordStore,
{
  pub fn new(store: S, config: ServerConfig) -> Self {
    let store = Arc::new(store);
    let credentials = LocalCredentials::new(
      store.clone(),
      config.token_secret.as_bytes(),
      chrono::Duration::minutes(config.token_ttl_minutes as i64),
    );
    Self {
      store,
      credentials: Arc::new(credentials),
      blobs: Arc::new(FsBlobStore::new(config.photo_dir.clone())),
      sessions: Arc::new(SessionStore::new(Duration::from_secs(
        config.session_ttl_minutes * 60,
      ))),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the rollcall server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + Clone + 'static,
{
  Router::new()
    // Accounts and sessions
    .route("/auth/sign_up", post(account::sign_up::<S>))
    .route("/auth/sign_in", post(account::sign_in::<S>))
    .route("/register", post(account::register::<S>))
    .route("/login", post(account::login::<S>))
    .route("/logout", post(account::logout::<S>))
    .route("/me", get(account::me::<S>))
    // Attendance
    .route("/stream", post(attendance::stream::<S>))
    .route("/attendance", get(attendance::list::<S>))
    .route("/attendance/{student_id}/{record_id}", delete(attendance::delete_one::<S>))
    // Roster
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/import", post(students::import::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .post(students::update::<S>)
        .delete(students::delete_one::<S>),
    )
    .route("/students_data", get(faces::students_data::<S>))
    .route("/faces/{file}", get(faces::serve::<S>))
    // Courses
    .route("/courses", get(courses::list::<S>).post(courses::add::<S>))
    .route("/courses/{code}", delete(courses::remove::<S>))
    .route("/switch_course", post(courses::switch::<S>))
    // Reports
    .route("/generate_report/{course}", get(report::generate::<S>))
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
