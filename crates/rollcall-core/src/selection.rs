//! Course-selection guard.
//!
//! The active course lives in the lecturer's session, but the set of courses
//! they manage lives in the store and may change underneath the session.
//! Every authenticated request re-derives the list and repairs the selection
//! with [`select_active_course`] before anything else runs.

/// Keep `current` if the lecturer still manages it, otherwise fall back to the
/// first managed course, or `None` if there are none.
pub fn select_active_course(courses: &[String], current: Option<&str>) -> Option<String> {
  match current {
    Some(c) if courses.iter().any(|m| m == c) => Some(c.to_owned()),
    _ => courses.first().cloned(),
  }
}

/// Switch to `requested` only if the lecturer manages it; any other request
/// leaves the (repaired) current selection in place.
pub fn switch_course(
  courses: &[String],
  requested: &str,
  current: Option<&str>,
) -> Option<String> {
  if courses.iter().any(|c| c == requested) {
    Some(requested.to_owned())
  } else {
    select_active_course(courses, current)
  }
}
