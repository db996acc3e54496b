//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rollcall_core::{
  record::{Account, AttendanceEvent, Lecturer, NewAttendance, Student},
  store::{AppendOutcome, RecordStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawEvent, RawLecturer, RawStudent, encode_courses, encode_day, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

const STUDENT_COLUMNS: &str = "matric_no, name, department, level, courses, face_image";
const EVENT_COLUMNS: &str = "event_id, student_id, course, recorded_at, recorded_by";

/// What the conditional append found inside its transaction.
enum RawAppend {
  Appended,
  Duplicate(RawEvent),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rollcall record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Lecturers ─────────────────────────────────────────────────────────────

  async fn get_lecturer(&self, lecturer_id: &str) -> Result<Option<Lecturer>> {
    let id = lecturer_id.to_owned();

    let raw: Option<RawLecturer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT lecturer_id, email, courses FROM lecturers WHERE lecturer_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawLecturer {
                  lecturer_id: row.get(0)?,
                  email:       row.get(1)?,
                  courses:     row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLecturer::into_lecturer).transpose()
  }

  async fn put_lecturer(&self, lecturer: Lecturer) -> Result<()> {
    let courses = encode_courses(&lecturer.courses)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO lecturers (lecturer_id, email, courses) VALUES (?1, ?2, ?3)
           ON CONFLICT (lecturer_id) DO UPDATE
             SET email = excluded.email, courses = excluded.courses",
          rusqlite::params![lecturer.lecturer_id, lecturer.email, courses],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_lecturer_courses(&self, lecturer_id: &str, courses: Vec<String>) -> Result<()> {
    let id = lecturer_id.to_owned();
    let encoded = encode_courses(&courses)?;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE lecturers SET courses = ?2 WHERE lecturer_id = ?1",
          rusqlite::params![id, encoded],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(rollcall_core::Error::LecturerNotFound(lecturer_id.to_owned()).into());
    }
    Ok(())
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn get_student(&self, matric_no: &str) -> Result<Option<Student>> {
    let id = matric_no.to_owned();

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE matric_no = ?1"),
              rusqlite::params![id],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    let raws: Vec<RawStudent> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY matric_no"))?;
        let rows = stmt
          .query_map([], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_student).collect()
  }

  async fn put_student(&self, student: Student) -> Result<()> {
    let courses = encode_courses(&student.courses)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (matric_no, name, department, level, courses, face_image)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (matric_no) DO UPDATE SET
             name       = excluded.name,
             department = excluded.department,
             level      = excluded.level,
             courses    = excluded.courses,
             face_image = excluded.face_image",
          rusqlite::params![
            student.matric_no,
            student.name,
            student.department,
            student.level,
            courses,
            student.face_image,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_student(&self, matric_no: &str) -> Result<bool> {
    let id = matric_no.to_owned();

    // Attendance rows go with the student via ON DELETE CASCADE.
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM students WHERE matric_no = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn list_attendance(&self, student_id: &str) -> Result<Vec<AttendanceEvent>> {
    let id = student_id.to_owned();

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM attendance WHERE student_id = ?1 ORDER BY recorded_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn list_all_attendance(&self) -> Result<Vec<AttendanceEvent>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM attendance ORDER BY recorded_at"))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn append_attendance_once(&self, input: NewAttendance) -> Result<AppendOutcome> {
    let day = encode_day(input.day());
    let event = input.into_event();

    let event_id_str = encode_uuid(event.event_id);
    let student_id = event.student_id.clone();
    let course = event.course.clone();
    let recorded_at_str = encode_dt(event.recorded_at);
    let recorded_by = event.recorded_by.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let existing = tx
          .query_row(
            &format!(
              "SELECT {EVENT_COLUMNS} FROM attendance
               WHERE student_id = ?1 AND course = ?2 AND day = ?3"
            ),
            rusqlite::params![student_id, course, day],
            RawEvent::from_row,
          )
          .optional()?;

        if let Some(existing) = existing {
          return Ok(RawAppend::Duplicate(existing));
        }

        tx.execute(
          "INSERT INTO attendance (event_id, student_id, course, recorded_at, day, recorded_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![event_id_str, student_id, course, recorded_at_str, day, recorded_by],
        )?;
        tx.commit()?;
        Ok(RawAppend::Appended)
      })
      .await?;

    match raw {
      RawAppend::Appended => Ok(AppendOutcome::Appended(event)),
      RawAppend::Duplicate(existing) => {
        tracing::debug!(
          student_id = %event.student_id,
          course = %event.course,
          "attendance slot already taken"
        );
        Ok(AppendOutcome::Duplicate(existing.into_event()?))
      }
    }
  }

  async fn remove_attendance(&self, student_id: &str, event_id: Uuid) -> Result<bool> {
    let student_id = student_id.to_owned();
    let event_id_str = encode_uuid(event_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attendance WHERE student_id = ?1 AND event_id = ?2",
          rusqlite::params![student_id, event_id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn insert_account(&self, account: Account) -> Result<()> {
    let email_key = account.email.to_lowercase();
    let email = account.email.clone();
    let created_at = encode_dt(account.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO accounts (email_key, email, lecturer_id, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (email_key) DO NOTHING",
          rusqlite::params![
            email_key,
            account.email,
            account.lecturer_id,
            account.password_hash,
            created_at,
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(rollcall_core::Error::AccountExists(email).into());
    }
    Ok(())
  }

  async fn find_account(&self, email: &str) -> Result<Option<Account>> {
    let email_key = email.to_lowercase();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT lecturer_id, email, password_hash, created_at
               FROM accounts WHERE email_key = ?1",
              rusqlite::params![email_key],
              |row| {
                Ok(RawAccount {
                  lecturer_id:   row.get(0)?,
                  email:         row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}
