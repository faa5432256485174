//! Cache Keys Module
//!
//! Structured keys for every memoized service query, grouped into families
//! that writes invalidate together.

use std::fmt;

use crate::models::SortOrder;

/// Keys that belong to an invalidation family.
pub trait FamilyKey {
    type Family: PartialEq;

    fn family(&self) -> Self::Family;
}

/// Set of keys whose values depend on the same kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Students,
    Groups,
    Subjects,
    /// Student/subject enrollment views
    Enrollments,
    Marks,
    MarkAverages,
}

/// Key of one memoized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Student listing filtered by age, sorted by name, or narrowed to one id
    Students {
        age: Option<u32>,
        sort: Option<SortOrder>,
        id: Option<i64>,
    },
    Student(i64),
    StudentsByGroup(i64),
    Groups {
        name_pattern: Option<String>,
        sort: Option<SortOrder>,
    },
    Group(i64),
    GroupByName(String),
    Subjects {
        name_pattern: Option<String>,
        sort: Option<SortOrder>,
    },
    Subject(i64),
    SubjectByName(String),
    SubjectsOfStudent(i64),
    StudentsOfSubject(i64),
    StudentWithSubjects(i64),
    SubjectWithStudents(i64),
    Marks {
        student_id: Option<i64>,
        subject_id: Option<i64>,
    },
    MarksByValue(i32),
    AvgByStudent(i64),
    AvgBySubject(i64),
}

impl FamilyKey for CacheKey {
    type Family = KeyFamily;

    fn family(&self) -> KeyFamily {
        match self {
            CacheKey::Students { .. } | CacheKey::Student(_) | CacheKey::StudentsByGroup(_) => {
                KeyFamily::Students
            }
            CacheKey::Groups { .. } | CacheKey::Group(_) | CacheKey::GroupByName(_) => {
                KeyFamily::Groups
            }
            CacheKey::Subjects { .. } | CacheKey::Subject(_) | CacheKey::SubjectByName(_) => {
                KeyFamily::Subjects
            }
            CacheKey::SubjectsOfStudent(_)
            | CacheKey::StudentsOfSubject(_)
            | CacheKey::StudentWithSubjects(_)
            | CacheKey::SubjectWithStudents(_) => KeyFamily::Enrollments,
            CacheKey::Marks { .. } | CacheKey::MarksByValue(_) => KeyFamily::Marks,
            CacheKey::AvgByStudent(_) | CacheKey::AvgBySubject(_) => KeyFamily::MarkAverages,
        }
    }
}

fn or_all<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "all".to_string(), ToString::to_string)
}

// Display renders the flat string form used in logs.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Students { age, sort, id } => write!(
                f,
                "students-{}-{}-{}",
                or_all(age),
                sort.map_or("none", |s| s.as_str()),
                or_all(id)
            ),
            CacheKey::Student(id) => write!(f, "student-{}", id),
            CacheKey::StudentsByGroup(id) => write!(f, "group-{}", id),
            CacheKey::Groups { name_pattern, sort } => write!(
                f,
                "allGroups-{}-{}",
                or_all(name_pattern),
                sort.map_or("none", |s| s.as_str())
            ),
            CacheKey::Group(id) => write!(f, "group_{}", id),
            CacheKey::GroupByName(name) => write!(f, "name_{}", name),
            CacheKey::Subjects { name_pattern, sort } => write!(
                f,
                "subjects-{}-{}",
                or_all(name_pattern),
                sort.map_or("default", |s| s.as_str())
            ),
            CacheKey::Subject(id) => write!(f, "subject-{}", id),
            CacheKey::SubjectByName(name) => write!(f, "subject-name-{}", name),
            CacheKey::SubjectsOfStudent(id) => write!(f, "subjects-of-{}", id),
            CacheKey::StudentsOfSubject(id) => write!(f, "students-of-{}", id),
            CacheKey::StudentWithSubjects(id) => write!(f, "student-with-subjects-{}", id),
            CacheKey::SubjectWithStudents(id) => write!(f, "subject-with-students-{}", id),
            CacheKey::Marks {
                student_id,
                subject_id,
            } => write!(f, "marks-{}-{}", or_all(student_id), or_all(subject_id)),
            CacheKey::MarksByValue(value) => write!(f, "value-{}", value),
            CacheKey::AvgByStudent(id) => write!(f, "avg-student-{}", id),
            CacheKey::AvgBySubject(id) => write!(f, "avg-subject-{}", id),
        }
    }
}
