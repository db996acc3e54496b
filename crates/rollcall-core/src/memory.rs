//! [`MemoryStore`], an in-process [`RecordStore`].
//!
//! Used when the server runs without a database and as the backing store for
//! unit tests. Every operation completes under a single lock, so
//! [`RecordStore::append_attendance_once`] is atomic.

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::{
  Error, Result,
  record::{Account, AttendanceEvent, Lecturer, NewAttendance, Student},
  store::{AppendOutcome, RecordStore},
};

#[derive(Default)]
struct Collections {
  lecturers:  BTreeMap<String, Lecturer>,
  students:   BTreeMap<String, Student>,
  /// `attendance/{matric_no}` → events in append order.
  attendance: BTreeMap<String, Vec<AttendanceEvent>>,
  /// Keyed by lower-cased email.
  accounts:   BTreeMap<String, Account>,
}

/// An in-memory record store.
///
/// Clones share the same collections.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Collections> {
    // A panic while holding the lock cannot leave the maps half-updated:
    // every mutation below is a single insert or remove.
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl RecordStore for MemoryStore {
  type Error = Error;

  // ── Lecturers ─────────────────────────────────────────────────────────────

  async fn get_lecturer(&self, lecturer_id: &str) -> Result<Option<Lecturer>> {
    Ok(self.lock().lecturers.get(lecturer_id).cloned())
  }

  async fn put_lecturer(&self, lecturer: Lecturer) -> Result<()> {
    self
      .lock()
      .lecturers
      .insert(lecturer.lecturer_id.clone(), lecturer);
    Ok(())
  }

  async fn set_lecturer_courses(
    &self,
    lecturer_id: &str,
    courses: Vec<String>,
  ) -> Result<()> {
    let mut data = self.lock();
    let lecturer = data
      .lecturers
      .get_mut(lecturer_id)
      .ok_or_else(|| Error::LecturerNotFound(lecturer_id.to_owned()))?;
    lecturer.courses = courses;
    Ok(())
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn get_student(&self, matric_no: &str) -> Result<Option<Student>> {
    Ok(self.lock().students.get(matric_no).cloned())
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    Ok(self.lock().students.values().cloned().collect())
  }

  async fn put_student(&self, student: Student) -> Result<()> {
    self.lock().students.insert(student.matric_no.clone(), student);
    Ok(())
  }

  async fn remove_student(&self, matric_no: &str) -> Result<bool> {
    let mut data = self.lock();
    data.attendance.remove(matric_no);
    Ok(data.students.remove(matric_no).is_some())
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn list_attendance(&self, student_id: &str) -> Result<Vec<AttendanceEvent>> {
    Ok(
      self
        .lock()
        .attendance
        .get(student_id)
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn list_all_attendance(&self) -> Result<Vec<AttendanceEvent>> {
    let mut events: Vec<AttendanceEvent> =
      self.lock().attendance.values().flatten().cloned().collect();
    events.sort_by_key(|ev| ev.recorded_at);
    Ok(events)
  }

  async fn append_attendance_once(&self, input: NewAttendance) -> Result<AppendOutcome> {
    let mut data = self.lock();
    let events = data.attendance.entry(input.student_id.clone()).or_default();

    let day = input.day();
    if let Some(existing) = events.iter().find(|ev| ev.same_slot(&input.course, day)) {
      return Ok(AppendOutcome::Duplicate(existing.clone()));
    }

    let event = input.into_event();
    events.push(event.clone());
    Ok(AppendOutcome::Appended(event))
  }

  async fn remove_attendance(&self, student_id: &str, event_id: Uuid) -> Result<bool> {
    let mut data = self.lock();
    let Some(events) = data.attendance.get_mut(student_id) else {
      return Ok(false);
    };
    let before = events.len();
    events.retain(|ev| ev.event_id != event_id);
    let removed = events.len() != before;
    if events.is_empty() {
      data.attendance.remove(student_id);
    }
    Ok(removed)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn insert_account(&self, account: Account) -> Result<()> {
    let key = account.email.to_lowercase();
    let mut data = self.lock();
    if data.accounts.contains_key(&key) {
      return Err(Error::AccountExists(account.email));
    }
    data.accounts.insert(key, account);
    Ok(())
  }

  async fn find_account(&self, email: &str) -> Result<Option<Account>> {
    Ok(self.lock().accounts.get(&email.to_lowercase()).cloned())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn new_attendance(course: &str, day: u32) -> NewAttendance {
    NewAttendance {
      student_id:  "S001".into(),
      course:      course.into(),
      recorded_at: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
      recorded_by: "lect-1".into(),
    }
  }

  #[tokio::test]
  async fn conditional_append_rejects_same_slot() {
    let store = MemoryStore::new();

    let first = store
      .append_attendance_once(new_attendance("CS101", 13))
      .await
      .unwrap();
    let AppendOutcome::Appended(first) = first else {
      panic!("first append should succeed");
    };

    let second = store
      .append_attendance_once(new_attendance("CS101", 13))
      .await
      .unwrap();
    assert_eq!(second, AppendOutcome::Duplicate(first));

    let other_day = store
      .append_attendance_once(new_attendance("CS101", 14))
      .await
      .unwrap();
    assert!(matches!(other_day, AppendOutcome::Appended(_)));
    assert_eq!(store.list_attendance("S001").await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn removing_last_event_drops_student_entry() {
    let store = MemoryStore::new();
    let AppendOutcome::Appended(ev) = store
      .append_attendance_once(new_attendance("CS101", 13))
      .await
      .unwrap()
    else {
      panic!("append should succeed");
    };

    assert!(store.remove_attendance("S001", ev.event_id).await.unwrap());
    assert!(!store.remove_attendance("S001", ev.event_id).await.unwrap());
    assert!(store.list_all_attendance().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn accounts_are_unique_by_email_case_insensitively() {
    let store = MemoryStore::new();
    let account = Account {
      lecturer_id:   "uid-1".into(),
      email:         "Lecturer@Example.com".into(),
      password_hash: "$argon2id$stub".into(),
      created_at:    Utc::now(),
    };
    store.insert_account(account.clone()).await.unwrap();

    let err = store.insert_account(account).await.unwrap_err();
    assert!(matches!(err, Error::AccountExists(_)));
    assert!(store.find_account("lecturer@example.com").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn updating_courses_of_missing_lecturer_errors() {
    let store = MemoryStore::new();
    let err = store
      .set_lecturer_courses("nobody", vec!["CS101".into()])
      .await
      .unwrap_err();
    assert!(matches!(err, Error::LecturerNotFound(_)));
  }
}
