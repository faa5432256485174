//! Subject reads and writes. Subject names are unique.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, Cacheable, KeyFamily, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{validate_name, NewSubject, Subject, SubjectQuery};
use crate::repository::Repository;
use crate::service::{invalidate_students, read_through};

#[derive(Clone)]
pub struct SubjectService {
    cache: Arc<ServiceCache>,
    repo: Arc<Repository>,
}

impl SubjectService {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self { cache, repo }
    }

    /// Lists subjects. A name pattern takes precedence over sorting.
    pub fn read_subjects(&self, query: &SubjectQuery) -> Result<Vec<Subject>> {
        let key = CacheKey::Subjects {
            name_pattern: query.name_pattern.clone(),
            sort: query.sort,
        };
        read_through(&self.cache, key, || {
            info!(
                "Fetching subjects with namePattern: {:?}, sort: {:?}",
                query.name_pattern, query.sort
            );
            Ok(self
                .repo
                .find_subjects(query.name_pattern.as_deref(), query.sort))
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Subject> {
        read_through(&self.cache, CacheKey::Subject(id), || {
            self.repo
                .find_subject(id)
                .ok_or_else(|| AppError::NotFound(format!("Subject not found with id: {}", id)))
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Subject> {
        read_through(&self.cache, CacheKey::SubjectByName(name.to_string()), || {
            self.repo.find_subject_by_name(name).ok_or_else(|| {
                AppError::NotFound(format!("Subject not found with name: {}", name))
            })
        })
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.repo.subject_name_exists(name)
    }

    /// Stores a subject; a taken name is `Conflict`.
    pub fn add_subject(&self, new: NewSubject) -> Result<Subject> {
        if let Some(msg) = validate_name(&new.name) {
            return Err(AppError::InvalidRequest(msg));
        }
        if self.exists_by_name(&new.name) {
            return Err(AppError::Conflict(format!(
                "Subject with name {} already exists",
                new.name
            )));
        }
        info!("Adding subject: {}", new.name);
        let subject = self.repo.insert_subject(new.name)?;

        self.cache.invalidate_family(&KeyFamily::Subjects);
        self.cache
            .put(CacheKey::Subject(subject.id), subject.clone().into_cached());
        self.cache.put(
            CacheKey::SubjectByName(subject.name.clone()),
            subject.clone().into_cached(),
        );
        Ok(subject)
    }

    pub fn delete_subject(&self, id: i64) -> Result<()> {
        info!("Deleting subject with id: {}", id);
        self.repo
            .delete_subject(id)
            .ok_or_else(|| AppError::NotFound(format!("Subject not found with id: {}", id)))?;
        self.evict();
        Ok(())
    }

    pub fn delete_subject_by_name(&self, name: &str) -> Result<()> {
        info!("Deleting subject with name: {}", name);
        self.repo.delete_subject_by_name(name).ok_or_else(|| {
            AppError::NotFound(format!("Subject not found with name: {}", name))
        })?;
        self.evict();
        Ok(())
    }

    // Deleting a subject also drops its marks and enrollments.
    fn evict(&self) {
        self.cache.invalidate_family(&KeyFamily::Subjects);
        invalidate_students(&self.cache);
        self.cache.invalidate_family(&KeyFamily::Marks);
        self.cache.invalidate_family(&KeyFamily::MarkAverages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMark, NewStudent, SortOrder};
    use std::time::Duration;

    fn service() -> (Arc<ServiceCache>, Arc<Repository>, SubjectService) {
        let cache = Arc::new(ServiceCache::new(Duration::from_secs(60), 100).unwrap());
        let repo = Arc::new(Repository::new());
        let service = SubjectService::new(cache.clone(), repo.clone());
        (cache, repo, service)
    }

    fn subject(name: &str) -> NewSubject {
        NewSubject { name: name.into() }
    }

    #[tokio::test]
    async fn test_add_and_find_subject() {
        let (cache, _repo, service) = service();

        let math = service.add_subject(subject("Math")).unwrap();

        assert!(cache.get(&CacheKey::SubjectByName("Math".into())).is_some());
        assert_eq!(service.find_by_id(math.id).unwrap(), math);
        assert_eq!(service.find_by_name("Math").unwrap(), math);
        assert!(matches!(service.find_by_id(999), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (_cache, _repo, service) = service();
        service.add_subject(subject("Math")).unwrap();

        assert!(service.exists_by_name("Math"));
        assert!(matches!(
            service.add_subject(subject("Math")),
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_subject_name_rejected() {
        let (_cache, _repo, service) = service();
        let result = service.add_subject(subject("  "));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_add_subject_refreshes_listing() {
        let (_cache, _repo, service) = service();
        let query = SubjectQuery {
            name_pattern: None,
            sort: Some(SortOrder::Asc),
        };
        service.add_subject(subject("Physics")).unwrap();
        assert_eq!(service.read_subjects(&query).unwrap().len(), 1);

        service.add_subject(subject("Math")).unwrap();

        let names: Vec<_> = service
            .read_subjects(&query)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Math", "Physics"]);
    }

    #[tokio::test]
    async fn test_delete_subject_by_name_drops_dependent_entries() {
        let (cache, repo, service) = service();
        let math = service.add_subject(subject("Math")).unwrap();
        let student = repo.insert_student(NewStudent {
            name: "Alice".into(),
            age: 20,
            group_id: None,
            subject_ids: vec![math.id],
        });
        repo.insert_mark(NewMark {
            value: 5,
            student_id: student.id,
            subject_id: math.id,
        });
        cache.put(CacheKey::AvgBySubject(math.id), Some(5.0).into_cached());
        cache.put(
            CacheKey::Student(student.id),
            student.clone().into_cached(),
        );

        service.delete_subject_by_name("Math").unwrap();

        assert!(cache.get(&CacheKey::Subject(math.id)).is_none());
        assert!(cache.get(&CacheKey::AvgBySubject(math.id)).is_none());
        assert!(cache.get(&CacheKey::Student(student.id)).is_none());
        assert!(repo.find_student(student.id).unwrap().subject_ids.is_empty());
        assert!(matches!(service.find_by_name("Math"), Err(AppError::NotFound(_))));
        assert!(matches!(service.delete_subject(math.id), Err(AppError::NotFound(_))));
    }
}
