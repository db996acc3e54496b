//! The attendance-marking workflow.
//!
//! Given a claimed student identity and the lecturer's active course, decide
//! whether to append a new [`AttendanceEvent`] and report a precise
//! [`Outcome`]. At most one event may exist per (student, course, UTC day).
//! The workflow holds no state of its own; everything it decides on is read
//! from the store on each call.

use chrono::{DateTime, Utc};
use strum::IntoStaticStr;

use crate::{
  record::{AttendanceEvent, NewAttendance},
  store::{AppendOutcome, RecordStore},
};

/// The tagged result of [`mark_attendance`].
///
/// Every variant except [`Outcome::StoreError`] is a normal business result.
/// The `strum` name is the `status` string sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Outcome {
  #[strum(serialize = "no_id")]
  NoIdentityProvided,
  #[strum(serialize = "error")]
  NoCourseSelected,
  #[strum(serialize = "invalid_id")]
  UnknownStudent,
  #[strum(serialize = "invalid_course")]
  CourseMismatch { name: String, course: String },
  #[strum(serialize = "already_marked")]
  AlreadyMarked { student_id: String, name: String },
  #[strum(serialize = "success")]
  Marked {
    student_id: String,
    name:       String,
    event:      AttendanceEvent,
  },
  /// The store failed; the operation may not have completed.
  #[strum(serialize = "error")]
  StoreError { message: String },
}

impl Outcome {
  /// Wire status string: `no_id`, `error`, `invalid_id`, `invalid_course`,
  /// `already_marked` or `success`.
  pub fn status(&self) -> &'static str { self.into() }

  /// Human-readable feedback for the UI.
  pub fn message(&self) -> String {
    match self {
      Self::NoIdentityProvided => "No student ID provided.".to_owned(),
      Self::NoCourseSelected => "No course selected.".to_owned(),
      Self::UnknownStudent => "Student not found in records.".to_owned(),
      Self::CourseMismatch { name, course } => {
        format!("Student ({name}) is not assigned to {course}.")
      }
      Self::AlreadyMarked { .. } => {
        "Attendance already marked for today.".to_owned()
      }
      Self::Marked { .. } => "Attendance marked successfully!".to_owned(),
      Self::StoreError { message } => message.clone(),
    }
  }

  pub fn student_id(&self) -> Option<&str> {
    match self {
      Self::AlreadyMarked { student_id, .. } | Self::Marked { student_id, .. } => {
        Some(student_id)
      }
      _ => None,
    }
  }

  pub fn name(&self) -> Option<&str> {
    match self {
      Self::CourseMismatch { name, .. }
      | Self::AlreadyMarked { name, .. }
      | Self::Marked { name, .. } => Some(name),
      _ => None,
    }
  }
}

fn store_error<E: std::error::Error>(e: E) -> Outcome {
  Outcome::StoreError { message: e.to_string() }
}

/// Mark `student_id` present for `active_course`, timestamped now.
///
/// `student_id` must already be normalised to the stored key; lookups are
/// case-sensitive.
pub async fn mark_attendance<S>(
  store: &S,
  student_id: &str,
  lecturer_id: &str,
  active_course: Option<&str>,
) -> Outcome
where
  S: RecordStore,
{
  mark_attendance_at(store, student_id, lecturer_id, active_course, Utc::now())
    .await
}

/// [`mark_attendance`] with an explicit current instant.
pub async fn mark_attendance_at<S>(
  store: &S,
  student_id: &str,
  lecturer_id: &str,
  active_course: Option<&str>,
  now: DateTime<Utc>,
) -> Outcome
where
  S: RecordStore,
{
  if student_id.is_empty() {
    return Outcome::NoIdentityProvided;
  }
  let Some(course) = active_course.filter(|c| !c.is_empty()) else {
    return Outcome::NoCourseSelected;
  };

  let student = match store.get_student(student_id).await {
    Ok(Some(s)) => s,
    Ok(None) => return Outcome::UnknownStudent,
    Err(e) => return store_error(e),
  };
  let name = student.display_name().to_owned();

  if !student.is_enrolled(course) {
    return Outcome::CourseMismatch { name, course: course.to_owned() };
  }

  let today = now.date_naive();
  let existing = match store.list_attendance(student_id).await {
    Ok(events) => events,
    Err(e) => return store_error(e),
  };
  if existing.iter().any(|ev| ev.same_slot(course, today)) {
    return Outcome::AlreadyMarked { student_id: student_id.to_owned(), name };
  }

  let input = NewAttendance {
    student_id:  student_id.to_owned(),
    course:      course.to_owned(),
    recorded_at: now,
    recorded_by: lecturer_id.to_owned(),
  };

  // The read above is only a fast path; a concurrent call for the same slot
  // is caught by the conditional append.
  match store.append_attendance_once(input).await {
    Ok(AppendOutcome::Appended(event)) => Outcome::Marked {
      student_id: student_id.to_owned(),
      name,
      event,
    },
    Ok(AppendOutcome::Duplicate(_)) => {
      Outcome::AlreadyMarked { student_id: student_id.to_owned(), name }
    }
    Err(e) => store_error(e),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use chrono::{Duration, TimeZone};
  use uuid::Uuid;

  use super::*;
  use crate::{
    memory::MemoryStore,
    record::{Account, Lecturer, Student},
  };

  /// Delegates to a [`MemoryStore`], counting calls and optionally failing
  /// every one of them.
  #[derive(Clone, Default)]
  struct CountingStore {
    inner: MemoryStore,
    calls: Arc<AtomicUsize>,
    fail:  bool,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("connection reset by peer")]
  struct Unavailable;

  impl CountingStore {
    fn failing() -> Self { Self { fail: true, ..Self::default() } }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn hit(&self) -> Result<(), Unavailable> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail { Err(Unavailable) } else { Ok(()) }
    }
  }

  fn infallible<T>(r: crate::Result<T>) -> T {
    r.expect("memory store operation")
  }

  impl RecordStore for CountingStore {
    type Error = Unavailable;

    async fn get_lecturer(&self, id: &str) -> Result<Option<Lecturer>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.get_lecturer(id).await))
    }
    async fn put_lecturer(&self, l: Lecturer) -> Result<(), Unavailable> {
      self.hit()?;
      infallible(self.inner.put_lecturer(l).await);
      Ok(())
    }
    async fn set_lecturer_courses(&self, id: &str, c: Vec<String>) -> Result<(), Unavailable> {
      self.hit()?;
      infallible(self.inner.set_lecturer_courses(id, c).await);
      Ok(())
    }
    async fn get_student(&self, id: &str) -> Result<Option<Student>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.get_student(id).await))
    }
    async fn list_students(&self) -> Result<Vec<Student>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.list_students().await))
    }
    async fn put_student(&self, s: Student) -> Result<(), Unavailable> {
      self.hit()?;
      infallible(self.inner.put_student(s).await);
      Ok(())
    }
    async fn remove_student(&self, id: &str) -> Result<bool, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.remove_student(id).await))
    }
    async fn list_attendance(&self, id: &str) -> Result<Vec<AttendanceEvent>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.list_attendance(id).await))
    }
    async fn list_all_attendance(&self) -> Result<Vec<AttendanceEvent>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.list_all_attendance().await))
    }
    async fn append_attendance_once(&self, i: NewAttendance) -> Result<AppendOutcome, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.append_attendance_once(i).await))
    }
    async fn remove_attendance(&self, id: &str, ev: Uuid) -> Result<bool, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.remove_attendance(id, ev).await))
    }
    async fn insert_account(&self, a: Account) -> Result<(), Unavailable> {
      self.hit()?;
      infallible(self.inner.insert_account(a).await);
      Ok(())
    }
    async fn find_account(&self, email: &str) -> Result<Option<Account>, Unavailable> {
      self.hit()?;
      Ok(infallible(self.inner.find_account(email).await))
    }
  }

  fn student(matric_no: &str, courses: &[&str]) -> Student {
    Student {
      matric_no:  matric_no.into(),
      name:       "John Doe".into(),
      department: "Computer Science".into(),
      level:      "200".into(),
      courses:    courses.iter().map(|c| c.to_string()).collect(),
      face_image: None,
    }
  }

  async fn seeded(courses: &[&str]) -> CountingStore {
    let store = CountingStore::default();
    store.inner.put_student(student("S001", courses)).await.unwrap();
    store
  }

  fn noon(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap()
  }

  async fn event_count(store: &CountingStore) -> usize {
    store.inner.list_all_attendance().await.unwrap().len()
  }

  // ─── Scenarios ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_mark_of_the_day_is_recorded() {
    let store = seeded(&["CS101"]).await;

    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    let Outcome::Marked { student_id, name, event } = &outcome else {
      panic!("expected Marked, got {outcome:?}");
    };
    assert_eq!(student_id, "S001");
    assert_eq!(name, "John Doe");
    assert_eq!(event.course, "CS101");
    assert_eq!(event.recorded_by, "lect-1");
    assert_eq!(event.recorded_at, noon(1));
    assert_eq!(outcome.status(), "success");

    let events = store.inner.list_attendance("S001").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].course, "CS101");
  }

  #[tokio::test]
  async fn second_mark_same_day_is_already_marked() {
    let store = seeded(&["CS101"]).await;
    mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    let later = noon(1) + Duration::hours(5);
    let outcome =
      mark_attendance_at(&store, "S001", "lect-2", Some("CS101"), later).await;

    assert_eq!(outcome, Outcome::AlreadyMarked {
      student_id: "S001".into(),
      name:       "John Doe".into(),
    });
    assert_eq!(outcome.status(), "already_marked");
    assert_eq!(event_count(&store).await, 1);
  }

  #[tokio::test]
  async fn next_day_is_marked_again() {
    let store = seeded(&["CS101"]).await;
    mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(2)).await;

    assert!(matches!(outcome, Outcome::Marked { .. }));
    assert_eq!(event_count(&store).await, 2);
  }

  #[tokio::test]
  async fn day_boundary_is_utc() {
    let store = seeded(&["CS101"]).await;
    let late = Utc.with_ymd_and_hms(2025, 7, 1, 23, 59, 59).unwrap();
    let early = Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 1).unwrap();

    mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), late).await;
    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), early).await;

    assert!(matches!(outcome, Outcome::Marked { .. }));
  }

  #[tokio::test]
  async fn other_course_same_day_is_independent() {
    let store = seeded(&["CS101", "MTH202"]).await;
    mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("MTH202"), noon(1)).await;

    assert!(matches!(outcome, Outcome::Marked { .. }));
    assert_eq!(event_count(&store).await, 2);
  }

  #[tokio::test]
  async fn unenrolled_course_is_a_mismatch() {
    let store = seeded(&["MTH202"]).await;

    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    assert_eq!(outcome, Outcome::CourseMismatch {
      name:   "John Doe".into(),
      course: "CS101".into(),
    });
    assert_eq!(outcome.status(), "invalid_course");
    assert_eq!(outcome.message(), "Student (John Doe) is not assigned to CS101.");
    assert_eq!(event_count(&store).await, 0);
  }

  #[tokio::test]
  async fn mismatch_holds_regardless_of_existing_events() {
    let store = seeded(&["MTH202"]).await;
    mark_attendance_at(&store, "S001", "lect-1", Some("MTH202"), noon(1)).await;

    for day in 1..=3 {
      let outcome =
        mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(day))
          .await;
      assert!(matches!(outcome, Outcome::CourseMismatch { .. }));
    }
    assert_eq!(event_count(&store).await, 1);
  }

  #[tokio::test]
  async fn unknown_student() {
    let store = seeded(&["CS101"]).await;

    let outcome =
      mark_attendance_at(&store, "S999", "lect-1", Some("CS101"), noon(1)).await;

    assert_eq!(outcome, Outcome::UnknownStudent);
    assert_eq!(outcome.status(), "invalid_id");
  }

  #[tokio::test]
  async fn lookup_is_case_sensitive() {
    let store = seeded(&["CS101"]).await;

    let outcome =
      mark_attendance_at(&store, "s001", "lect-1", Some("CS101"), noon(1)).await;

    assert_eq!(outcome, Outcome::UnknownStudent);
  }

  #[tokio::test]
  async fn empty_identity_makes_no_store_calls() {
    let store = seeded(&["CS101"]).await;

    let outcome = mark_attendance(&store, "", "lect-1", Some("CS101")).await;

    assert_eq!(outcome, Outcome::NoIdentityProvided);
    assert_eq!(outcome.status(), "no_id");
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn missing_course_is_rejected_before_any_lookup() {
    let store = seeded(&["CS101"]).await;

    for course in [None, Some("")] {
      let outcome = mark_attendance(&store, "S001", "lect-1", course).await;
      assert_eq!(outcome, Outcome::NoCourseSelected);
      assert_eq!(outcome.status(), "error");
      assert_eq!(outcome.message(), "No course selected.");
    }
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn store_failure_is_reported_not_retried() {
    let store = CountingStore::failing();

    let outcome =
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)).await;

    assert_eq!(outcome, Outcome::StoreError {
      message: "connection reset by peer".into(),
    });
    assert_eq!(outcome.status(), "error");
    assert_eq!(store.calls(), 1);
  }

  #[tokio::test]
  async fn concurrent_marks_record_one_event() {
    let store = seeded(&["CS101"]).await;

    let (a, b) = tokio::join!(
      mark_attendance_at(&store, "S001", "lect-1", Some("CS101"), noon(1)),
      mark_attendance_at(&store, "S001", "lect-2", Some("CS101"), noon(1)),
    );

    let marked = [&a, &b]
      .iter()
      .filter(|o| matches!(o, Outcome::Marked { .. }))
      .count();
    assert_eq!(marked, 1, "outcomes: {a:?} / {b:?}");
    assert_eq!(event_count(&store).await, 1);
  }
}
