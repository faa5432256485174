//! Student reads and writes.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, Cacheable, KeyFamily, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{validate_name, NewStudent, Student, StudentQuery, UpdateStudent};
use crate::repository::Repository;
use crate::service::{invalidate_students, read_through};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Student not found with id: {}", id))
}

#[derive(Clone)]
pub struct StudentService {
    cache: Arc<ServiceCache>,
    repo: Arc<Repository>,
}

impl StudentService {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self { cache, repo }
    }

    /// Lists students, narrowed to one id when `query.id` is set.
    pub fn read_students(&self, query: &StudentQuery) -> Result<Vec<Student>> {
        let key = CacheKey::Students {
            age: query.age,
            sort: query.sort,
            id: query.id,
        };
        read_through(&self.cache, key, || {
            info!(
                "Fetching students with age: {:?}, sort: {:?}, id: {:?}",
                query.age, query.sort, query.id
            );
            match query.id {
                Some(id) => self
                    .repo
                    .find_student(id)
                    .map(|student| vec![student])
                    .ok_or_else(|| not_found(id)),
                None => Ok(self.repo.find_students(query.age, query.sort)),
            }
        })
    }

    pub fn find_by_group(&self, group_id: i64) -> Result<Vec<Student>> {
        read_through(&self.cache, CacheKey::StudentsByGroup(group_id), || {
            info!("Fetching students from group ID: {}", group_id);
            Ok(self.repo.find_students_by_group(group_id))
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Student> {
        read_through(&self.cache, CacheKey::Student(id), || {
            info!("Fetching student with id: {}", id);
            self.repo.find_student(id).ok_or_else(|| not_found(id))
        })
    }

    pub fn add_student(&self, new: NewStudent) -> Result<Student> {
        if let Some(msg) = validate_name(&new.name) {
            return Err(AppError::InvalidRequest(msg));
        }
        info!("Saving student: {}", new.name);
        let joins_group = new.group_id.is_some();
        let student = self.repo.insert_student(new);

        invalidate_students(&self.cache);
        if joins_group {
            self.cache.invalidate_family(&KeyFamily::Groups);
        }
        self.cache
            .put(CacheKey::Student(student.id), student.clone().into_cached());
        Ok(student)
    }

    pub fn update_student(&self, id: i64, update: UpdateStudent) -> Result<Student> {
        if let Some(msg) = validate_name(&update.name) {
            return Err(AppError::InvalidRequest(msg));
        }
        info!("Updating student with id: {}", id);
        if !self.repo.update_student(id, update.name, update.age) {
            return Err(not_found(id));
        }
        invalidate_students(&self.cache);
        self.repo.find_student(id).ok_or_else(|| not_found(id))
    }

    /// Deletes the student and their marks.
    pub fn delete_student(&self, id: i64) -> Result<()> {
        info!("Deleting student with id: {}", id);
        let student = self.repo.delete_student(id).ok_or_else(|| not_found(id))?;

        invalidate_students(&self.cache);
        self.cache.invalidate_family(&KeyFamily::Marks);
        self.cache.invalidate_family(&KeyFamily::MarkAverages);
        if student.group_id.is_some() {
            self.cache.invalidate_family(&KeyFamily::Groups);
        }
        info!("Student with id {} deleted", id);
        Ok(())
    }
}
