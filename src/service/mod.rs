//! Service Module
//!
//! Read paths consult the shared cache before the backing store and memoize
//! what they load; write paths update the store and then drop every cached
//! key the change makes stale.

mod groups;
mod marks;
mod student_subjects;
mod students;
mod subjects;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::cache::{CacheKey, Cacheable, KeyFamily, ServiceCache};
use crate::error::Result;
use crate::repository::Repository;

pub use groups::GroupService;
pub use marks::MarkService;
pub use student_subjects::StudentSubjectService;
pub use students::StudentService;
pub use subjects::SubjectService;

/// Returns the cached value for `key`, or runs `load` and caches its result.
///
/// Errors from `load` are returned as-is and nothing is cached.
pub(crate) fn read_through<T, F>(cache: &ServiceCache, key: CacheKey, load: F) -> Result<T>
where
    T: Cacheable + Clone,
    F: FnOnce() -> Result<T>,
{
    if let Some(cached) = cache.get(&key) {
        match T::from_cached(cached) {
            Some(value) => {
                debug!("Cache hit for {}", key);
                return Ok(value);
            }
            None => warn!("Cached value for {} has an unexpected type, reloading", key),
        }
    }

    let start = Instant::now();
    let value = load()?;
    debug!("Loaded {} in {} ms", key, start.elapsed().as_millis());
    cache.put(key, value.clone().into_cached());
    Ok(value)
}

/// Drops every cached value that embeds student records.
pub(crate) fn invalidate_students(cache: &ServiceCache) {
    cache.invalidate_family(&KeyFamily::Students);
    cache.invalidate_family(&KeyFamily::Enrollments);
}

/// All services, sharing one cache and one backing store.
#[derive(Clone)]
pub struct Services {
    pub students: StudentService,
    pub groups: GroupService,
    pub subjects: SubjectService,
    pub student_subjects: StudentSubjectService,
    pub marks: MarkService,
}

impl Services {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self {
            students: StudentService::new(cache.clone(), repo.clone()),
            groups: GroupService::new(cache.clone(), repo.clone()),
            subjects: SubjectService::new(cache.clone(), repo.clone()),
            student_subjects: StudentSubjectService::new(cache.clone(), repo.clone()),
            marks: MarkService::new(cache, repo),
        }
    }
}
