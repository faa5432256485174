//! API Handlers
//!
//! HTTP request handlers delegating to the services.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::cache::ServiceCache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    AverageResponse, EnrollmentQuery, Group, GroupQuery, HealthResponse, Mark, MarkQuery,
    MessageResponse, NewGroup, NewMark, NewStudent, NewSubject, SpecificMarkQuery,
    StatsResponse, Student, StudentQuery, StudentWithSubjects, Subject, SubjectQuery,
    SubjectWithStudents, UpdateStudent,
};
use crate::repository::Repository;
use crate::service::Services;

/// Application state shared across all handlers.
///
/// Holds the single cache instance and the services built around it.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ServiceCache>,
    pub services: Services,
}

impl AppState {
    /// Creates a new AppState around an existing cache and store.
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        let services = Services::new(cache.clone(), repo);
        Self { cache, services }
    }

    /// Creates a new AppState with an empty store and a cache sized from configuration.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = Arc::new(ServiceCache::from_config(config)?);
        Ok(Self::new(cache, Arc::new(Repository::new())))
    }
}

// == Students ==

pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<Student>>> {
    state.services.students.read_students(&query).map(Json)
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>> {
    state.services.students.find_by_id(id).map(Json)
}

pub async fn students_by_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<Student>>> {
    state.services.students.find_by_group(group_id).map(Json)
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<NewStudent>,
) -> Result<(StatusCode, Json<Student>)> {
    let student = state.services.students.add_student(req)?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStudent>,
) -> Result<Json<Student>> {
    state.services.students.update_student(id, req).map(Json)
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.services.students.delete_student(id)?;
    Ok(Json(MessageResponse::new(format!(
        "Student with id {} deleted",
        id
    ))))
}

// == Groups ==

pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Vec<Group>>> {
    state.services.groups.read_groups(&query).map(Json)
}

pub async fn get_group(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Group>> {
    state.services.groups.find_by_id(id).map(Json)
}

pub async fn get_group_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Group>> {
    state.services.groups.find_by_name(&name).map(Json)
}

pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<NewGroup>,
) -> Result<(StatusCode, Json<Group>)> {
    let group = state.services.groups.add_group(req)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.services.groups.delete_group(id)?;
    Ok(Json(MessageResponse::new(format!(
        "Group with id {} deleted",
        id
    ))))
}

pub async fn delete_group_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.services.groups.delete_group_by_name(&name)?;
    Ok(Json(MessageResponse::new(format!(
        "Group with name {} deleted",
        name
    ))))
}

// == Subjects ==

pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Vec<Subject>>> {
    state.services.subjects.read_subjects(&query).map(Json)
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(req): Json<NewSubject>,
) -> Result<(StatusCode, Json<Subject>)> {
    let subject = state.services.subjects.add_subject(req)?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Subject>> {
    state.services.subjects.find_by_id(id).map(Json)
}

pub async fn get_subject_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Subject>> {
    state.services.subjects.find_by_name(&name).map(Json)
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.services.subjects.delete_subject(id)?;
    Ok(Json(MessageResponse::new(format!(
        "Subject with id {} deleted",
        id
    ))))
}

pub async fn delete_subject_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.services.subjects.delete_subject_by_name(&name)?;
    Ok(Json(MessageResponse::new(format!(
        "Subject with name {} deleted",
        name
    ))))
}

// == Enrollment ==

pub async fn enroll_student(
    State(state): State<AppState>,
    Query(query): Query<EnrollmentQuery>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state
        .services
        .student_subjects
        .add_subject_to_student(query.student_id, query.subject_id)?;
    let message = format!(
        "Subject {} added to student {}",
        query.subject_id, query.student_id
    );
    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))))
}

pub async fn withdraw_student(
    State(state): State<AppState>,
    Query(query): Query<EnrollmentQuery>,
) -> Result<Json<MessageResponse>> {
    state
        .services
        .student_subjects
        .remove_subject_from_student(query.student_id, query.subject_id)?;
    Ok(Json(MessageResponse::new(format!(
        "Subject {} removed from student {}",
        query.subject_id, query.student_id
    ))))
}

pub async fn subjects_of_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<Subject>>> {
    state
        .services
        .student_subjects
        .subjects_by_student(student_id)
        .map(Json)
}

pub async fn students_of_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<Json<Vec<Student>>> {
    state
        .services
        .student_subjects
        .students_by_subject(subject_id)
        .map(Json)
}

pub async fn student_with_subjects(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<StudentWithSubjects>> {
    state
        .services
        .student_subjects
        .student_with_subjects(student_id)
        .map(Json)
}

pub async fn subject_with_students(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<Json<SubjectWithStudents>> {
    state
        .services
        .student_subjects
        .subject_with_students(subject_id)
        .map(Json)
}

// == Marks ==

pub async fn list_marks(
    State(state): State<AppState>,
    Query(query): Query<MarkQuery>,
) -> Result<Json<Vec<Mark>>> {
    state.services.marks.read_marks(&query).map(Json)
}

pub async fn marks_by_value(
    State(state): State<AppState>,
    Path(value): Path<i32>,
) -> Result<Json<Vec<Mark>>> {
    state.services.marks.find_by_value(value).map(Json)
}

pub async fn average_by_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<AverageResponse>> {
    let average = state.services.marks.average_by_student(student_id)?;
    Ok(Json(AverageResponse { average }))
}

pub async fn average_by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<Json<AverageResponse>> {
    let average = state.services.marks.average_by_subject(subject_id)?;
    Ok(Json(AverageResponse { average }))
}

pub async fn create_mark(
    State(state): State<AppState>,
    Json(req): Json<NewMark>,
) -> Result<(StatusCode, Json<Mark>)> {
    let mark = state.services.marks.add_mark(req)?;
    Ok((StatusCode::CREATED, Json(mark)))
}

pub async fn delete_mark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.services.marks.delete_mark(id)?;
    Ok(Json(MessageResponse::new(format!(
        "Mark with id {} deleted",
        id
    ))))
}

pub async fn delete_specific_mark(
    State(state): State<AppState>,
    Query(query): Query<SpecificMarkQuery>,
) -> Result<Json<MessageResponse>> {
    let deleted = state.services.marks.delete_mark_specific(&query)?;
    Ok(Json(MessageResponse::new(format!(
        "{} specific mark(s) deleted",
        deleted
    ))))
}

// == Operational ==

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;
    Json(StatsResponse::new(
        cache.stats(),
        cache.max_size(),
        cache.max_age().as_millis() as u64,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
