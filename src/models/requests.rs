//! Request DTOs for the campus API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::models::SortOrder;

/// Query string for `GET /students`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
    pub age: Option<u32>,
    pub sort: Option<SortOrder>,
    pub id: Option<i64>,
}

/// Query string for `GET /groups`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupQuery {
    /// Substring the group name must contain
    pub name: Option<String>,
    pub sort: Option<SortOrder>,
}

/// Query string for `GET /subjects`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectQuery {
    /// Substring the subject name must contain
    pub name_pattern: Option<String>,
    pub sort: Option<SortOrder>,
}

/// Query string for `POST` and `DELETE /student-subjects`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EnrollmentQuery {
    pub student_id: i64,
    pub subject_id: i64,
}

/// Query string for `DELETE /marks/delete-specific`
#[derive(Debug, Clone, Deserialize)]
pub struct SpecificMarkQuery {
    pub student_id: i64,
    pub subject_name: String,
    pub value: i32,
    /// Narrows the match to one mark
    pub id: Option<i64>,
}

/// Query string for `GET /marks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkQuery {
    pub student_id: Option<i64>,
    pub subject_id: Option<i64>,
}

/// Body of `POST /students`
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub subject_ids: Vec<i64>,
}

/// Body of `PUT /students/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStudent {
    pub name: String,
    pub age: u32,
}

/// Body of `POST /groups`
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

/// Body of `POST /subjects`
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
    pub name: String,
}

/// Body of `POST /marks`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMark {
    pub value: i32,
    pub student_id: i64,
    pub subject_id: i64,
}

/// Returns an error message if a display name is unusable, None if valid.
pub fn validate_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if name.len() > 128 {
        return Some("Name exceeds maximum length of 128 characters".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_student_defaults() {
        let json = r#"{"name": "Alice", "age": 20}"#;
        let req: NewStudent = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Alice");
        assert!(req.group_id.is_none());
        assert!(req.subject_ids.is_empty());
    }

    #[test]
    fn test_new_mark_deserialize() {
        let json = r#"{"value": 5, "student_id": 1, "subject_id": 2}"#;
        let req: NewMark = serde_json::from_str(json).unwrap();
        assert_eq!(req.value, 5);
        assert_eq!(req.subject_id, 2);
    }

    #[test]
    fn test_specific_mark_query_id_optional() {
        let json = r#"{"student_id": 1, "subject_name": "Math", "value": 4}"#;
        let query: SpecificMarkQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.subject_name, "Math");
        assert!(query.id.is_none());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("   ").is_some());
        assert!(validate_name(&"x".repeat(129)).is_some());
        assert!(validate_name("Group 7").is_none());
    }
}
