//! Attendance report projection.
//!
//! Joins the attendance events of one course with the roster into flat rows:
//! one `Present` row per event, then one `Absent` row per enrolled student
//! who was never marked. Rendering (CSV) is the caller's job.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::record::{AttendanceEvent, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendanceStatus {
  Present,
  Absent,
}

/// One line of the exported sheet. Field renames are the column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
  #[serde(rename = "Name")]
  pub name:      String,
  #[serde(rename = "Matric No")]
  pub matric_no: String,
  #[serde(rename = "Date")]
  pub date:      String,
  #[serde(rename = "Time")]
  pub time:      String,
  #[serde(rename = "Course")]
  pub course:    String,
  #[serde(rename = "Status")]
  pub status:    AttendanceStatus,
}

const NOT_APPLICABLE: &str = "N/A";

/// Build the report for `course`. Dates and times are UTC.
pub fn build_report(
  course: &str,
  students: &[Student],
  events: &[AttendanceEvent],
) -> Vec<ReportRow> {
  let roster: BTreeMap<&str, &Student> =
    students.iter().map(|s| (s.matric_no.as_str(), s)).collect();

  let mut present: Vec<&AttendanceEvent> =
    events.iter().filter(|ev| ev.course == course).collect();
  present.sort_by_key(|ev| ev.recorded_at);

  let mut seen = HashSet::new();
  let mut rows = Vec::with_capacity(present.len() + students.len());

  for ev in present {
    seen.insert(ev.student_id.as_str());
    let (name, matric_no) = match roster.get(ev.student_id.as_str()) {
      Some(s) => (s.display_name().to_owned(), s.matric_no.clone()),
      None => ("Unknown".to_owned(), ev.student_id.clone()),
    };
    rows.push(ReportRow {
      name,
      matric_no,
      date: ev.recorded_at.format("%Y-%m-%d").to_string(),
      time: ev.recorded_at.format("%H:%M:%S").to_string(),
      course: ev.course.clone(),
      status: AttendanceStatus::Present,
    });
  }

  for s in students {
    if s.is_enrolled(course) && !seen.contains(s.matric_no.as_str()) {
      rows.push(ReportRow {
        name:      s.display_name().to_owned(),
        matric_no: s.matric_no.clone(),
        date:      NOT_APPLICABLE.to_owned(),
        time:      NOT_APPLICABLE.to_owned(),
        course:    course.to_owned(),
        status:    AttendanceStatus::Absent,
      });
    }
  }

  rows
}
