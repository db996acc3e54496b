//! Roster rules: creating, editing, and bulk-importing students.
//!
//! These are pure functions over [`Student`] records; the caller does the
//! store reads and writes around them.

use serde::Deserialize;

use crate::{
  Error, Result,
  record::{Student, normalize_course, normalize_matric_no, parse_course_list},
};

fn required(value: &str, field: &'static str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::MissingField(field));
  }
  Ok(trimmed.to_owned())
}

fn or_existing(value: Option<&str>, existing: &str) -> String {
  match value.map(str::trim) {
    Some(v) if !v.is_empty() => v.to_owned(),
    _ => existing.to_owned(),
  }
}

// ─── Single student ──────────────────────────────────────────────────────────

/// A manually entered student. `course` is the course to enrol them in,
/// usually the lecturer's active course.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub name:       String,
  pub matric_no:  String,
  pub department: String,
  pub level:      String,
  pub course:     String,
}

impl NewStudent {
  /// Validate and normalise into a [`Student`] with no face image.
  pub fn into_student(self) -> Result<Student> {
    let name = required(&self.name, "name")?;
    let matric_no = normalize_matric_no(&required(&self.matric_no, "matric_no")?);
    let department = required(&self.department, "department")?;
    let level = required(&self.level, "level")?;
    let course = normalize_course(&required(&self.course, "course")?);

    Ok(Student {
      matric_no,
      name,
      department,
      level,
      courses: vec![course],
      face_image: None,
    })
  }
}

/// Partial update of an existing student. Blank or absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
  pub name:              Option<String>,
  pub department:        Option<String>,
  pub level:             Option<String>,
  /// Comma-separated; replaces the course list when present and non-blank.
  pub courses:           Option<String>,
  #[serde(default)]
  pub delete_face_image: bool,
}

impl StudentPatch {
  /// Apply to `existing`. The face image is left untouched; image
  /// replacement and deletion need the blob store and happen in the caller.
  pub fn apply(&self, existing: &Student) -> Student {
    let courses = match self.courses.as_deref() {
      Some(raw) if !raw.trim().is_empty() => parse_course_list(raw),
      _ => existing.courses.clone(),
    };

    Student {
      matric_no: existing.matric_no.clone(),
      name: or_existing(self.name.as_deref(), &existing.name),
      department: or_existing(self.department.as_deref(), &existing.department),
      level: or_existing(self.level.as_deref(), &existing.level),
      courses,
      face_image: existing.face_image.clone(),
    }
  }
}

// ─── Bulk import ─────────────────────────────────────────────────────────────

/// One row of an uploaded roster sheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
  #[serde(rename = "Name")]
  pub name:       String,
  #[serde(rename = "Matric No")]
  pub matric_no:  String,
  #[serde(rename = "Department")]
  pub department: String,
  #[serde(rename = "Level")]
  pub level:      String,
}

impl RosterEntry {
  /// A row is importable only when every column is filled in.
  pub fn is_complete(&self) -> bool {
    [&self.name, &self.matric_no, &self.department, &self.level]
      .iter()
      .all(|v| !v.trim().is_empty())
  }
}

/// Upsert an imported row: identity fields come from the row, `course` is
/// added to any existing enrolment, and an existing face image is kept.
pub fn merge_import(existing: Option<Student>, entry: &RosterEntry, course: &str) -> Student {
  let matric_no = normalize_matric_no(&entry.matric_no);
  let (courses, face_image) = match existing {
    Some(s) => (s.courses, s.face_image),
    None => (Vec::new(), None),
  };

  let mut student = Student {
    matric_no,
    name: entry.name.trim().to_owned(),
    department: entry.department.trim().to_owned(),
    level: entry.level.trim().to_owned(),
    courses,
    face_image,
  };
  student.enroll(&normalize_course(course));
  student
}
