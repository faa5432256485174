//! Typed values stored in the service cache.

use crate::models::{
    Group, Mark, Student, StudentWithSubjects, Subject, SubjectWithStudents,
};

/// Result of one memoized query.
///
/// Empty lists and `Average(None)` are ordinary payloads: they record that
/// the backing store had nothing, so a hit on them skips the lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Students(Vec<Student>),
    Student(Student),
    Groups(Vec<Group>),
    Group(Group),
    Subjects(Vec<Subject>),
    Subject(Subject),
    StudentWithSubjects(StudentWithSubjects),
    SubjectWithStudents(SubjectWithStudents),
    Marks(Vec<Mark>),
    Average(Option<f64>),
}

/// Conversion between a query result and its `CachedValue` variant.
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;

    /// None if `value` holds a different variant.
    fn from_cached(value: CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Student>, Students);
cacheable!(Student, Student);
cacheable!(Vec<Group>, Groups);
cacheable!(Group, Group);
cacheable!(Vec<Subject>, Subjects);
cacheable!(Subject, Subject);
cacheable!(StudentWithSubjects, StudentWithSubjects);
cacheable!(SubjectWithStudents, SubjectWithStudents);
cacheable!(Vec<Mark>, Marks);
cacheable!(Option<f64>, Average);
