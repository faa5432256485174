//! Domain entities held by the backing store and cached by the services.

use serde::{Deserialize, Serialize};

/// Ordering applied to name-sorted listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub group_id: Option<i64>,
    /// Subjects the student is enrolled in
    pub subject_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub student_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: i64,
    pub value: i32,
    pub student_id: i64,
    pub subject_id: i64,
}

/// A student together with the subjects they are enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentWithSubjects {
    #[serde(flatten)]
    pub student: Student,
    pub subjects: Vec<Subject>,
}

/// A subject together with the students enrolled in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectWithStudents {
    #[serde(flatten)]
    pub subject: Subject,
    pub students: Vec<Student>,
}
