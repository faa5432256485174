//! Campus Cache - student, group, subject and mark backend
//!
//! REST services over an in-memory store, with a bounded cache in front of
//! every read whose entries expire on their own after a fixed lifetime.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;
mod tasks;

pub use api::AppState;
pub use cache::{BoundedTtlCache, ServiceCache};
pub use config::Config;
pub use error::{AppError, Result};
