//! The `RecordStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (`rollcall-store-sqlite`,
//! [`crate::memory::MemoryStore`]). The workflow functions and the server
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::record::{Account, AttendanceEvent, Lecturer, NewAttendance, Student};

/// Result of [`RecordStore::append_attendance_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
  /// The event was written.
  Appended(AttendanceEvent),
  /// An event for the same student, course, and UTC day already exists;
  /// nothing was written.
  Duplicate(AttendanceEvent),
}

/// Abstraction over the Record Store.
///
/// Keyed collections mirror the document paths `lecturers/{id}`,
/// `students/{matric_no}` and `attendance/{matric_no}/{event_id}`. Keys are
/// compared case-sensitively.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Lecturers ─────────────────────────────────────────────────────────

  /// Retrieve a lecturer by credential-service id. Returns `None` if absent.
  fn get_lecturer<'a>(
    &'a self,
    lecturer_id: &'a str,
  ) -> impl Future<Output = Result<Option<Lecturer>, Self::Error>> + Send + 'a;

  /// Create or replace a lecturer record.
  fn put_lecturer(
    &self,
    lecturer: Lecturer,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the course list of an existing lecturer.
  ///
  /// Returns an error if the lecturer does not exist.
  fn set_lecturer_courses<'a>(
    &'a self,
    lecturer_id: &'a str,
    courses: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Students ──────────────────────────────────────────────────────────

  /// Retrieve a student by matriculation code. Returns `None` if absent.
  fn get_student<'a>(
    &'a self,
    matric_no: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  /// List the whole roster, ordered by matriculation code.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Create or replace a student record.
  fn put_student(
    &self,
    student: Student,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a student together with all of their attendance events.
  /// Returns `false` if the student did not exist.
  fn remove_student<'a>(
    &'a self,
    matric_no: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Attendance ────────────────────────────────────────────────────────

  /// All events recorded under one student, oldest first.
  fn list_attendance<'a>(
    &'a self,
    student_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + 'a;

  /// Every event in the store, oldest first.
  fn list_all_attendance(
    &self,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + '_;

  /// Append an event unless one already exists for the same student, course,
  /// and UTC day. The check and the write are a single atomic step.
  fn append_attendance_once(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AppendOutcome, Self::Error>> + Send + '_;

  /// Remove one event. Returns `false` if it did not exist.
  fn remove_attendance<'a>(
    &'a self,
    student_id: &'a str,
    event_id: uuid::Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new sign-in account. Returns an error if the email is taken.
  fn insert_account(
    &self,
    account: Account,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up an account by (lower-cased) email.
  fn find_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;
}
