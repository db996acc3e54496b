//! Record types held by the Record Store: lecturers, students, and the
//! attendance events appended under each student.
//!
//! Optional fields are defaulted here, once, so the rest of the workspace
//! never has to null-check a record read back from storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Matriculation codes are the student primary key: trimmed and upper-case.
pub fn normalize_matric_no(raw: &str) -> String { raw.trim().to_uppercase() }

/// Course codes are compared verbatim everywhere, so they are stored
/// trimmed and upper-case.
pub fn normalize_course(raw: &str) -> String { raw.trim().to_uppercase() }

/// Parse a comma-separated course list (`"cs101, MTH202,,cs101"`) into
/// normalised, de-duplicated codes in first-seen order.
pub fn parse_course_list(raw: &str) -> Vec<String> {
  let mut courses = Vec::new();
  for code in raw.split(',').map(normalize_course) {
    if !code.is_empty() && !courses.contains(&code) {
      courses.push(code);
    }
  }
  courses
}

// ─── Lecturer ────────────────────────────────────────────────────────────────

/// A lecturer, keyed by the identifier issued by the credential service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecturer {
  pub lecturer_id: String,
  pub email:       String,
  /// Ordered set of managed course codes. The first entry is the fallback
  /// active course.
  #[serde(default)]
  pub courses:     Vec<String>,
}

impl Lecturer {
  pub fn new(lecturer_id: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      lecturer_id: lecturer_id.into(),
      email:       email.into(),
      courses:     Vec::new(),
    }
  }

  pub fn manages(&self, course: &str) -> bool {
    self.courses.iter().any(|c| c == course)
  }

  /// Add a course; returns `false` if it was already managed.
  pub fn add_course(&mut self, course: &str) -> bool {
    if self.manages(course) {
      return false;
    }
    self.courses.push(course.to_owned());
    true
  }

  /// Remove a course; returns `false` if it was not managed.
  pub fn remove_course(&mut self, course: &str) -> bool {
    let before = self.courses.len();
    self.courses.retain(|c| c != course);
    self.courses.len() != before
  }

  /// Union `courses` into the managed set, keeping existing order first.
  pub fn merge_courses<I>(&mut self, courses: I)
  where
    I: IntoIterator<Item = String>,
  {
    for course in courses {
      self.add_course(&course);
    }
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// A student on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  /// Primary key; see [`normalize_matric_no`].
  pub matric_no:  String,
  pub name:       String,
  pub department: String,
  pub level:      String,
  #[serde(default)]
  pub courses:    Vec<String>,
  /// Locator of the reference face photo, either a remote URL or a path
  /// inside the blob store. See [`FaceLocator`].
  #[serde(default)]
  pub face_image: Option<String>,
}

impl Student {
  pub fn is_enrolled(&self, course: &str) -> bool {
    self.courses.iter().any(|c| c == course)
  }

  /// Name shown in UI feedback; never empty.
  pub fn display_name(&self) -> &str {
    if self.name.trim().is_empty() { "Unknown" } else { &self.name }
  }

  /// Add a course to the enrolment list; no-op if already enrolled.
  pub fn enroll(&mut self, course: &str) {
    if !self.is_enrolled(course) {
      self.courses.push(course.to_owned());
    }
  }
}

/// Where a reference face image lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLocator<'a> {
  /// Hosted elsewhere; served to the browser as-is.
  Remote(&'a str),
  /// A path inside the blob store, e.g. `faces/S001.jpg`.
  Stored(&'a str),
  Unknown(&'a str),
}

impl<'a> FaceLocator<'a> {
  pub fn classify(locator: &'a str) -> Self {
    if locator.starts_with("https://") || locator.starts_with("http://") {
      Self::Remote(locator)
    } else if locator.starts_with("faces/") {
      Self::Stored(locator)
    } else {
      Self::Unknown(locator)
    }
  }
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// A single attendance mark. Append-only; removed only by explicit lecturer
/// action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
  pub event_id:    Uuid,
  pub student_id:  String,
  pub course:      String,
  pub recorded_at: DateTime<Utc>,
  /// Identifier of the lecturer whose session recorded the mark.
  pub recorded_by: String,
}

impl AttendanceEvent {
  /// The UTC calendar day this event counts towards.
  pub fn day(&self) -> NaiveDate { self.recorded_at.date_naive() }

  /// Whether this event occupies the same (course, day) slot as `other`.
  pub fn same_slot(&self, course: &str, day: NaiveDate) -> bool {
    self.course == course && self.day() == day
  }
}

/// Input to [`crate::store::RecordStore::append_attendance_once`].
/// The event id is always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttendance {
  pub student_id:  String,
  pub course:      String,
  pub recorded_at: DateTime<Utc>,
  pub recorded_by: String,
}

impl NewAttendance {
  pub fn day(&self) -> NaiveDate { self.recorded_at.date_naive() }

  /// Materialise the event with a freshly generated id.
  pub fn into_event(self) -> AttendanceEvent {
    AttendanceEvent {
      event_id:    Uuid::new_v4(),
      student_id:  self.student_id,
      course:      self.course,
      recorded_at: self.recorded_at,
      recorded_by: self.recorded_by,
    }
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A sign-in account held by the local credential service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub lecturer_id:   String,
  pub email:         String,
  /// PHC string produced by argon2.
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}
