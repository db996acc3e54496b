//! SQL schema for the rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS lecturers (
    lecturer_id TEXT PRIMARY KEY,   -- credential-service identifier
    email       TEXT NOT NULL,
    courses     TEXT NOT NULL DEFAULT '[]'   -- JSON array, ordered
);

CREATE TABLE IF NOT EXISTS students (
    matric_no   TEXT PRIMARY KEY,   -- upper-case; compared case-sensitively
    name        TEXT NOT NULL,
    department  TEXT NOT NULL,
    level       TEXT NOT NULL,
    courses     TEXT NOT NULL DEFAULT '[]',
    face_image  TEXT                -- remote URL or blob-store path
);

-- Attendance events are append-only; rows are deleted only by explicit
-- lecturer action or together with their student.
CREATE TABLE IF NOT EXISTS attendance (
    event_id    TEXT PRIMARY KEY,
    student_id  TEXT NOT NULL REFERENCES students(matric_no) ON DELETE CASCADE,
    course      TEXT NOT NULL,
    recorded_at TEXT NOT NULL,      -- RFC 3339 UTC
    day         TEXT NOT NULL,      -- UTC calendar date of recorded_at
    recorded_by TEXT NOT NULL,
    UNIQUE (student_id, course, day)
);

CREATE TABLE IF NOT EXISTS accounts (
    email_key     TEXT PRIMARY KEY, -- lower-cased email
    email         TEXT NOT NULL,
    lecturer_id   TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attendance_course_idx   ON attendance(course);
CREATE INDEX IF NOT EXISTS attendance_recorded_idx ON attendance(recorded_at);

PRAGMA user_version = 1;
";
