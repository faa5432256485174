//! API Routes
//!
//! Configures the Axum router with all campus endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::*;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/group/:group_id", get(students_by_group))
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", get(get_group).delete(delete_group))
        .route(
            "/groups/name/:name",
            get(get_group_by_name).delete(delete_group_by_name),
        )
        .route("/subjects", get(list_subjects).post(create_subject))
        .route("/subjects/:id", get(get_subject).delete(delete_subject))
        .route(
            "/subjects/name/:name",
            get(get_subject_by_name).delete(delete_subject_by_name),
        )
        .route(
            "/student-subjects",
            post(enroll_student).delete(withdraw_student),
        )
        .route("/student-subjects/:id/subjects", get(subjects_of_student))
        .route("/student-subjects/:id/students", get(students_of_subject))
        .route(
            "/student-subjects/student/:id/with-subjects",
            get(student_with_subjects),
        )
        .route(
            "/student-subjects/subject/:id/with-students",
            get(subject_with_students),
        )
        .route("/marks", get(list_marks).post(create_mark))
        .route("/marks/delete-specific", delete(delete_specific_mark))
        .route("/marks/:id", delete(delete_mark))
        .route("/marks/value/:value", get(marks_by_value))
        .route("/marks/average/student/:id", get(average_by_student))
        .route("/marks/average/subject/:id", get(average_by_subject))
        .route("/cache/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
