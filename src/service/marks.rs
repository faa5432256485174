//! Mark reads, averages and writes.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, KeyFamily, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{Mark, MarkQuery, NewMark, SpecificMarkQuery};
use crate::repository::Repository;
use crate::service::read_through;

#[derive(Clone)]
pub struct MarkService {
    cache: Arc<ServiceCache>,
    repo: Arc<Repository>,
}

impl MarkService {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self { cache, repo }
    }

    fn require_student(&self, id: i64) -> Result<()> {
        self.repo
            .find_student(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Student not found with id: {}", id)))
    }

    fn require_subject(&self, id: i64) -> Result<()> {
        self.repo
            .find_subject(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Subject not found with id: {}", id)))
    }

    /// Lists marks filtered by student and/or subject.
    ///
    /// When both filters are given, both must name existing entities.
    pub fn read_marks(&self, query: &MarkQuery) -> Result<Vec<Mark>> {
        let key = CacheKey::Marks {
            student_id: query.student_id,
            subject_id: query.subject_id,
        };
        read_through(&self.cache, key, || {
            info!(
                "Fetching marks for student: {:?}, subject: {:?}",
                query.student_id, query.subject_id
            );
            if let (Some(student_id), Some(subject_id)) = (query.student_id, query.subject_id) {
                self.require_student(student_id)?;
                self.require_subject(subject_id)?;
            }
            Ok(self.repo.find_marks(query.student_id, query.subject_id))
        })
    }

    pub fn find_by_value(&self, value: i32) -> Result<Vec<Mark>> {
        read_through(&self.cache, CacheKey::MarksByValue(value), || {
            Ok(self.repo.find_marks_by_value(value))
        })
    }

    /// Mean mark of a student; None, also cached, when they have no marks.
    pub fn average_by_student(&self, student_id: i64) -> Result<Option<f64>> {
        read_through(&self.cache, CacheKey::AvgByStudent(student_id), || {
            Ok(self.repo.average_by_student(student_id))
        })
    }

    /// Mean mark in a subject; None, also cached, when it has no marks.
    pub fn average_by_subject(&self, subject_id: i64) -> Result<Option<f64>> {
        read_through(&self.cache, CacheKey::AvgBySubject(subject_id), || {
            Ok(self.repo.average_by_subject(subject_id))
        })
    }

    pub fn add_mark(&self, new: NewMark) -> Result<Mark> {
        info!(
            "Adding mark for student: {}, subject: {}, value: {}",
            new.student_id, new.subject_id, new.value
        );
        self.require_student(new.student_id)?;
        self.require_subject(new.subject_id)?;

        let mark = self.repo.insert_mark(new);
        self.cache.remove(&CacheKey::AvgByStudent(mark.student_id));
        self.cache.remove(&CacheKey::AvgBySubject(mark.subject_id));
        self.cache.invalidate_family(&KeyFamily::Marks);
        Ok(mark)
    }

    pub fn delete_mark(&self, id: i64) -> Result<()> {
        info!("Deleting mark with id: {}", id);
        let mark = self
            .repo
            .delete_mark(id)
            .ok_or_else(|| AppError::NotFound(format!("Mark not found with id: {}", id)))?;
        self.evict(&[mark]);
        Ok(())
    }

    /// Deletes the student's marks of `query.value` in the named subject,
    /// narrowed to `query.id` when given. Returns how many were deleted.
    pub fn delete_mark_specific(&self, query: &SpecificMarkQuery) -> Result<usize> {
        info!(
            "Deleting specific mark for student: {}, subject: {}, value: {}, id: {:?}",
            query.student_id, query.subject_name, query.value, query.id
        );
        let deleted = self.repo.delete_marks_matching(query);
        if deleted.is_empty() {
            return Err(AppError::NotFound(
                "Mark not found with the given criteria".to_string(),
            ));
        }
        self.evict(&deleted);
        Ok(deleted.len())
    }

    fn evict(&self, marks: &[Mark]) {
        for mark in marks {
            self.cache.remove(&CacheKey::AvgByStudent(mark.student_id));
            self.cache.remove(&CacheKey::AvgBySubject(mark.subject_id));
        }
        self.cache.invalidate_family(&KeyFamily::Marks);
    }
}
