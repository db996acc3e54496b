//! Encoding and decoding helpers between rollcall records and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar days as `YYYY-MM-DD`.
//! Course lists are compact JSON arrays. UUIDs are hyphenated lowercase.

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_core::record::{Account, AttendanceEvent, Lecturer, Student};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_day(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

// ─── Course lists ────────────────────────────────────────────────────────────

pub fn encode_courses(courses: &[String]) -> Result<String> {
  Ok(serde_json::to_string(courses)?)
}

pub fn decode_courses(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `lecturers` row.
pub struct RawLecturer {
  pub lecturer_id: String,
  pub email:       String,
  pub courses:     String,
}

impl RawLecturer {
  pub fn into_lecturer(self) -> Result<Lecturer> {
    Ok(Lecturer {
      lecturer_id: self.lecturer_id,
      email:       self.email,
      courses:     decode_courses(&self.courses)?,
    })
  }
}

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub matric_no:  String,
  pub name:       String,
  pub department: String,
  pub level:      String,
  pub courses:    String,
  pub face_image: Option<String>,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      matric_no:  row.get(0)?,
      name:       row.get(1)?,
      department: row.get(2)?,
      level:      row.get(3)?,
      courses:    row.get(4)?,
      face_image: row.get(5)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      matric_no:  self.matric_no,
      name:       self.name,
      department: self.department,
      level:      self.level,
      courses:    decode_courses(&self.courses)?,
      face_image: self.face_image,
    })
  }
}

/// Raw strings read directly from an `attendance` row.
pub struct RawEvent {
  pub event_id:    String,
  pub student_id:  String,
  pub course:      String,
  pub recorded_at: String,
  pub recorded_by: String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:    row.get(0)?,
      student_id:  row.get(1)?,
      course:      row.get(2)?,
      recorded_at: row.get(3)?,
      recorded_by: row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      event_id:    decode_uuid(&self.event_id)?,
      student_id:  self.student_id,
      course:      self.course,
      recorded_at: decode_dt(&self.recorded_at)?,
      recorded_by: self.recorded_by,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub lecturer_id:   String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      lecturer_id:   self.lecturer_id,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
