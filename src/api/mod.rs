//! API Module
//!
//! HTTP handlers and routing for the campus REST API.
//!
//! # Endpoints
//! - `/students`, `/students/:id`, `/students/group/:group_id`
//! - `/groups`, `/groups/:id`, `/groups/name/:name`
//! - `/subjects`, `/subjects/:id`, `/subjects/name/:name`
//! - `/student-subjects`, `/student-subjects/:id/{subjects,students}`,
//!   `/student-subjects/{student,subject}/:id/with-{subjects,students}`
//! - `/marks`, `/marks/:id`, `/marks/delete-specific`, `/marks/value/:value`,
//!   `/marks/average/{student,subject}/:id`
//! - `GET /cache/stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
