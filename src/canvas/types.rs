// Canvas API response types.
// Raw wire shapes are normalized into `TodoItem` at the client boundary so
// downstream code never branches on where a field happened to appear.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub primary_email: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Student")
    }
}

/// Active-enrollment course as returned by the courses endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCourse {
    pub id: i64,
    pub name: Option<String>,
    pub course_code: Option<String>,
}

impl RawCourse {
    /// Display name with the name -> course code -> numbered fallback chain.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.course_code.clone())
            .unwrap_or_else(|| format!("Course #{}", self.id))
    }
}

/// Mapping from course id to display name.
pub type CourseMap = BTreeMap<i64, String>;

/// Assignment sub-object nested inside some to-do item variants.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssignment {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub course_id: Option<i64>,
    pub html_url: Option<String>,
}

/// A to-do item as it comes off the wire. Fields may appear at the top
/// level or nested under `assignment` depending on the endpoint variant.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTodoItem {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub course_id: Option<i64>,
    pub context_name: Option<String>,
    pub html_url: Option<String>,
    pub assignment: Option<RawAssignment>,
}

/// Normalized to-do item. Immutable snapshot of server state; local
/// done/snooze bookkeeping lives in a separate store keyed by `key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoItem {
    /// Stable identifier: url, falling back to assignment id, then item id.
    pub key: String,
    pub title: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub course_id: Option<i64>,
    pub context_name: Option<String>,
    pub url: Option<String>,
}

impl TodoItem {
    /// Title for display.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

impl From<RawTodoItem> for TodoItem {
    fn from(raw: RawTodoItem) -> Self {
        let assignment = raw.assignment;

        let title = raw
            .title
            .or_else(|| assignment.as_ref().and_then(|a| a.name.clone()));
        // Assignment-scoped due date wins over the top-level one.
        let due_at = assignment
            .as_ref()
            .and_then(|a| a.due_at)
            .or(raw.due_at);
        let course_id = assignment
            .as_ref()
            .and_then(|a| a.course_id)
            .or(raw.course_id);
        let url = raw
            .html_url
            .or_else(|| assignment.as_ref().and_then(|a| a.html_url.clone()));

        let key = url
            .clone()
            .or_else(|| {
                assignment
                    .as_ref()
                    .and_then(|a| a.id)
                    .map(|id| id.to_string())
            })
            .or_else(|| raw.id.map(|id| id.to_string()))
            .unwrap_or_default();

        Self {
            key,
            title,
            due_at,
            course_id,
            context_name: raw.context_name,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_item(json: &str) -> TodoItem {
        let raw: RawTodoItem = serde_json::from_str(json).unwrap();
        raw.into()
    }

    #[test]
    fn test_normalize_nested_assignment_fields() {
        let item = parse_item(
            r#"{
                "assignment": {
                    "id": 99,
                    "name": "Problem set 4",
                    "due_at": "2026-03-10T17:00:00Z",
                    "course_id": 5,
                    "html_url": "https://school.example/assignments/99"
                }
            }"#,
        );

        assert_eq!(item.title.as_deref(), Some("Problem set 4"));
        assert_eq!(item.course_id, Some(5));
        assert_eq!(item.url.as_deref(), Some("https://school.example/assignments/99"));
        assert_eq!(item.key, "https://school.example/assignments/99");
        assert!(item.due_at.is_some());
    }

    #[test]
    fn test_assignment_due_date_wins_over_top_level() {
        let item = parse_item(
            r#"{
                "due_at": "2026-01-01T00:00:00Z",
                "assignment": { "due_at": "2026-02-02T00:00:00Z" }
            }"#,
        );

        let due = item.due_at.unwrap();
        assert_eq!(due.to_rfc3339(), "2026-02-02T00:00:00+00:00");
    }

    #[test]
    fn test_top_level_title_wins() {
        let item = parse_item(
            r#"{ "title": "Quiz reminder", "assignment": { "name": "Quiz 2" } }"#,
        );
        assert_eq!(item.title.as_deref(), Some("Quiz reminder"));
    }

    #[test]
    fn test_key_falls_back_to_assignment_id_then_item_id() {
        let item = parse_item(r#"{ "id": 3, "assignment": { "id": 77 } }"#);
        assert_eq!(item.key, "77");

        let item = parse_item(r#"{ "id": 3 }"#);
        assert_eq!(item.key, "3");
    }

    #[test]
    fn test_untitled_fallback() {
        let item = parse_item(r#"{ "id": 1 }"#);
        assert_eq!(item.display_title(), "Untitled");
    }

    #[test]
    fn test_course_display_name_chain() {
        let full: RawCourse =
            serde_json::from_str(r#"{ "id": 5, "name": "Algebra", "course_code": "MATH-101" }"#)
                .unwrap();
        assert_eq!(full.display_name(), "Algebra");

        let code_only: RawCourse =
            serde_json::from_str(r#"{ "id": 5, "course_code": "MATH-101" }"#).unwrap();
        assert_eq!(code_only.display_name(), "MATH-101");

        let bare: RawCourse = serde_json::from_str(r#"{ "id": 5 }"#).unwrap();
        assert_eq!(bare.display_name(), "Course #5");
    }
}
