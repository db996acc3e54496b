//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use rollcall_core::{
  attendance::{Outcome, mark_attendance_at},
  record::{Account, Lecturer, NewAttendance, Student},
  store::{AppendOutcome, RecordStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn student(matric_no: &str, courses: &[&str]) -> Student {
  Student {
    matric_no:  matric_no.into(),
    name:       "John Doe".into(),
    department: "Computer Science".into(),
    level:      "200".into(),
    courses:    courses.iter().map(|c| c.to_string()).collect(),
    face_image: Some(format!("faces/{matric_no}.jpeg")),
  }
}

fn new_attendance(student_id: &str, course: &str, hour: u32) -> NewAttendance {
  NewAttendance {
    student_id:  student_id.into(),
    course:      course.into(),
    recorded_at: Utc.with_ymd_and_hms(2025, 6, 13, hour, 0, 0).unwrap(),
    recorded_by: "lect-1".into(),
  }
}

// ─── Lecturers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_lecturer() {
  let s = store().await;
  let mut lecturer = Lecturer::new("uid-1", "lecturer@example.com");
  lecturer.courses = vec!["CS101".into(), "MTH202".into()];
  s.put_lecturer(lecturer.clone()).await.unwrap();

  let fetched = s.get_lecturer("uid-1").await.unwrap();
  assert_eq!(fetched, Some(lecturer));
}

#[tokio::test]
async fn get_lecturer_missing_returns_none() {
  let s = store().await;
  assert!(s.get_lecturer("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn set_lecturer_courses_updates_in_place() {
  let s = store().await;
  s.put_lecturer(Lecturer::new("uid-1", "l@example.com")).await.unwrap();

  s.set_lecturer_courses("uid-1", vec!["PHY303".into()]).await.unwrap();

  let fetched = s.get_lecturer("uid-1").await.unwrap().unwrap();
  assert_eq!(fetched.courses, vec!["PHY303"]);
  assert_eq!(fetched.email, "l@example.com");
}

#[tokio::test]
async fn set_courses_for_missing_lecturer_errors() {
  let s = store().await;
  let err = s
    .set_lecturer_courses("nobody", vec![])
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(rollcall_core::Error::LecturerNotFound(_))
  ));
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_get_and_replace_student() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();

  let mut updated = student("S001", &["CS101", "MTH202"]);
  updated.face_image = None;
  s.put_student(updated.clone()).await.unwrap();

  assert_eq!(s.get_student("S001").await.unwrap(), Some(updated));
}

#[tokio::test]
async fn student_keys_are_case_sensitive() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();
  assert!(s.get_student("s001").await.unwrap().is_none());
}

#[tokio::test]
async fn list_students_is_ordered_by_matric_no() {
  let s = store().await;
  s.put_student(student("S003", &[])).await.unwrap();
  s.put_student(student("S001", &[])).await.unwrap();
  s.put_student(student("S002", &[])).await.unwrap();

  let ids: Vec<String> = s
    .list_students()
    .await
    .unwrap()
    .into_iter()
    .map(|st| st.matric_no)
    .collect();
  assert_eq!(ids, vec!["S001", "S002", "S003"]);
}

#[tokio::test]
async fn remove_student_cascades_to_attendance() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();
  s.put_student(student("S002", &["CS101"])).await.unwrap();
  s.append_attendance_once(new_attendance("S001", "CS101", 9)).await.unwrap();
  s.append_attendance_once(new_attendance("S002", "CS101", 9)).await.unwrap();

  assert!(s.remove_student("S001").await.unwrap());
  assert!(!s.remove_student("S001").await.unwrap());

  assert!(s.list_attendance("S001").await.unwrap().is_empty());
  assert_eq!(s.list_all_attendance().await.unwrap().len(), 1);
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn conditional_append_enforces_one_per_day() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();

  let first = s
    .append_attendance_once(new_attendance("S001", "CS101", 9))
    .await
    .unwrap();
  let AppendOutcome::Appended(first) = first else {
    panic!("first append should be written");
  };

  let second = s
    .append_attendance_once(new_attendance("S001", "CS101", 15))
    .await
    .unwrap();
  assert_eq!(second, AppendOutcome::Duplicate(first.clone()));

  let other_course = s
    .append_attendance_once(new_attendance("S001", "MTH202", 15))
    .await
    .unwrap();
  assert!(matches!(other_course, AppendOutcome::Appended(_)));

  let events = s.list_attendance("S001").await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0], first);
}

#[tokio::test]
async fn remove_attendance_by_id() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();
  let AppendOutcome::Appended(ev) = s
    .append_attendance_once(new_attendance("S001", "CS101", 9))
    .await
    .unwrap()
  else {
    panic!("append should be written");
  };

  assert!(!s.remove_attendance("S002", ev.event_id).await.unwrap());
  assert!(!s.remove_attendance("S001", Uuid::new_v4()).await.unwrap());
  assert!(s.remove_attendance("S001", ev.event_id).await.unwrap());
  assert!(s.list_attendance("S001").await.unwrap().is_empty());
}

#[tokio::test]
async fn workflow_against_sqlite() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();
  let now = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();

  let first = mark_attendance_at(&s, "S001", "lect-1", Some("CS101"), now).await;
  assert!(matches!(first, Outcome::Marked { .. }));

  let again =
    mark_attendance_at(&s, "S001", "lect-1", Some("CS101"), now + Duration::hours(2)).await;
  assert!(matches!(again, Outcome::AlreadyMarked { .. }));

  let tomorrow =
    mark_attendance_at(&s, "S001", "lect-1", Some("CS101"), now + Duration::days(1)).await;
  assert!(matches!(tomorrow, Outcome::Marked { .. }));

  assert_eq!(s.list_attendance("S001").await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_workflow_calls_write_once() {
  let s = store().await;
  s.put_student(student("S001", &["CS101"])).await.unwrap();
  let now = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();

  let mut handles = Vec::new();
  for i in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      mark_attendance_at(&s, "S001", &format!("lect-{i}"), Some("CS101"), now).await
    }));
  }

  let mut marked = 0;
  for h in handles {
    match h.await.unwrap() {
      Outcome::Marked { .. } => marked += 1,
      Outcome::AlreadyMarked { .. } => {}
      other => panic!("unexpected outcome {other:?}"),
    }
  }
  assert_eq!(marked, 1);
  assert_eq!(s.list_attendance("S001").await.unwrap().len(), 1);
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn accounts_are_unique_by_email() {
  let s = store().await;
  let account = Account {
    lecturer_id:   "uid-1".into(),
    email:         "Lecturer@Example.com".into(),
    password_hash: "$argon2id$v=19$stub".into(),
    created_at:    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
  };
  s.insert_account(account.clone()).await.unwrap();

  let found = s.find_account("lecturer@example.com").await.unwrap().unwrap();
  assert_eq!(found.lecturer_id, "uid-1");
  assert_eq!(found.email, "Lecturer@Example.com");
  assert_eq!(found.created_at, account.created_at);

  let mut dup = account;
  dup.lecturer_id = "uid-2".into();
  dup.email = "LECTURER@example.com".into();
  let err = s.insert_account(dup).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(rollcall_core::Error::AccountExists(_))
  ));
}
