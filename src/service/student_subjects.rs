//! Student enrollment in subjects.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{Student, StudentWithSubjects, Subject, SubjectWithStudents};
use crate::repository::Repository;
use crate::service::{invalidate_students, read_through};

fn student_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Student not found with id: {}", id))
}

fn subject_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Subject not found with id: {}", id))
}

#[derive(Clone)]
pub struct StudentSubjectService {
    cache: Arc<ServiceCache>,
    repo: Arc<Repository>,
}

impl StudentSubjectService {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self { cache, repo }
    }

    fn require_both(&self, student_id: i64, subject_id: i64) -> Result<()> {
        self.repo
            .find_student(student_id)
            .ok_or_else(|| student_not_found(student_id))?;
        self.repo
            .find_subject(subject_id)
            .ok_or_else(|| subject_not_found(subject_id))?;
        Ok(())
    }

    /// Enrolls the student. Enrolling twice is a no-op.
    pub fn add_subject_to_student(&self, student_id: i64, subject_id: i64) -> Result<()> {
        self.require_both(student_id, subject_id)?;
        info!("Adding subject {} to student {}", subject_id, student_id);
        if self.repo.enroll(student_id, subject_id) {
            invalidate_students(&self.cache);
        }
        Ok(())
    }

    /// Withdraws the student. Removing a subject they do not have is a no-op.
    pub fn remove_subject_from_student(&self, student_id: i64, subject_id: i64) -> Result<()> {
        self.require_both(student_id, subject_id)?;
        info!("Removing subject {} from student {}", subject_id, student_id);
        if self.repo.unenroll(student_id, subject_id) {
            invalidate_students(&self.cache);
        }
        Ok(())
    }

    pub fn subjects_by_student(&self, student_id: i64) -> Result<Vec<Subject>> {
        read_through(&self.cache, CacheKey::SubjectsOfStudent(student_id), || {
            self.repo
                .subjects_of_student(student_id)
                .ok_or_else(|| student_not_found(student_id))
        })
    }

    pub fn students_by_subject(&self, subject_id: i64) -> Result<Vec<Student>> {
        read_through(&self.cache, CacheKey::StudentsOfSubject(subject_id), || {
            self.repo
                .students_of_subject(subject_id)
                .ok_or_else(|| subject_not_found(subject_id))
        })
    }

    pub fn student_with_subjects(&self, student_id: i64) -> Result<StudentWithSubjects> {
        read_through(&self.cache, CacheKey::StudentWithSubjects(student_id), || {
            let student = self
                .repo
                .find_student(student_id)
                .ok_or_else(|| student_not_found(student_id))?;
            let subjects = self
                .repo
                .subjects_of_student(student_id)
                .unwrap_or_default();
            Ok(StudentWithSubjects { student, subjects })
        })
    }

    pub fn subject_with_students(&self, subject_id: i64) -> Result<SubjectWithStudents> {
        read_through(&self.cache, CacheKey::SubjectWithStudents(subject_id), || {
            let subject = self
                .repo
                .find_subject(subject_id)
                .ok_or_else(|| subject_not_found(subject_id))?;
            let students = self
                .repo
                .students_of_subject(subject_id)
                .unwrap_or_default();
            Ok(SubjectWithStudents { subject, students })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStudent, UpdateStudent};
    use crate::service::StudentService;
    use std::time::Duration;

    struct Fixture {
        cache: Arc<ServiceCache>,
        repo: Arc<Repository>,
        service: StudentSubjectService,
        student: Student,
        subject: Subject,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(ServiceCache::new(Duration::from_secs(60), 100).unwrap());
        let repo = Arc::new(Repository::new());
        let student = repo.insert_student(NewStudent {
            name: "Alice".into(),
            age: 20,
            group_id: None,
            subject_ids: Vec::new(),
        });
        let subject = repo.insert_subject("Math".into()).unwrap();
        let service = StudentSubjectService::new(cache.clone(), repo.clone());
        Fixture {
            cache,
            repo,
            service,
            student,
            subject,
        }
    }

    #[tokio::test]
    async fn test_enroll_refreshes_cached_views() {
        let f = fixture();
        assert!(f.service.subjects_by_student(f.student.id).unwrap().is_empty());
        assert!(f.service.students_by_subject(f.subject.id).unwrap().is_empty());

        f.service
            .add_subject_to_student(f.student.id, f.subject.id)
            .unwrap();

        assert_eq!(
            f.service.subjects_by_student(f.student.id).unwrap(),
            vec![f.subject.clone()]
        );
        let enrolled = f.service.students_by_subject(f.subject.id).unwrap();
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].subject_ids, vec![f.subject.id]);
    }

    #[tokio::test]
    async fn test_enroll_drops_cached_student() {
        let f = fixture();
        let students = StudentService::new(f.cache.clone(), f.repo.clone());
        assert!(students.find_by_id(f.student.id).unwrap().subject_ids.is_empty());

        f.service
            .add_subject_to_student(f.student.id, f.subject.id)
            .unwrap();

        assert_eq!(
            students.find_by_id(f.student.id).unwrap().subject_ids,
            vec![f.subject.id]
        );
    }

    #[tokio::test]
    async fn test_remove_subject_from_student() {
        let f = fixture();
        f.service
            .add_subject_to_student(f.student.id, f.subject.id)
            .unwrap();
        let view = f.service.student_with_subjects(f.student.id).unwrap();
        assert_eq!(view.subjects.len(), 1);

        f.service
            .remove_subject_from_student(f.student.id, f.subject.id)
            .unwrap();

        let view = f.service.student_with_subjects(f.student.id).unwrap();
        assert!(view.subjects.is_empty());
        assert!(view.student.subject_ids.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let f = fixture();

        assert!(matches!(
            f.service.add_subject_to_student(999, f.subject.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.remove_subject_from_student(f.student.id, 999),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.subjects_by_student(999),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.subject_with_students(999),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_student_update_refreshes_subject_view() {
        let f = fixture();
        let students = StudentService::new(f.cache.clone(), f.repo.clone());
        f.service
            .add_subject_to_student(f.student.id, f.subject.id)
            .unwrap();
        let view = f.service.subject_with_students(f.subject.id).unwrap();
        assert_eq!(view.students[0].name, "Alice");

        students
            .update_student(
                f.student.id,
                UpdateStudent {
                    name: "Alicia".into(),
                    age: 20,
                },
            )
            .unwrap();

        let view = f.service.subject_with_students(f.subject.id).unwrap();
        assert_eq!(view.students[0].name, "Alicia");
    }
}
