//! Domain entities plus request and response models for the campus API
//!
//! This module defines the entities held by the backing store and the DTOs
//! used for serializing/deserializing HTTP request and response bodies.

pub mod entities;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use entities::{
    Group, Mark, SortOrder, Student, StudentWithSubjects, Subject, SubjectWithStudents,
};
pub use requests::{
    validate_name, EnrollmentQuery, GroupQuery, MarkQuery, NewGroup, NewMark, NewStudent,
    NewSubject, SpecificMarkQuery, StudentQuery, SubjectQuery, UpdateStudent,
};
pub use responses::{AverageResponse, HealthResponse, MessageResponse, StatsResponse};
