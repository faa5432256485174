//! Group reads and writes.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, Cacheable, KeyFamily, ServiceCache};
use crate::error::{AppError, Result};
use crate::models::{validate_name, Group, GroupQuery, NewGroup};
use crate::repository::Repository;
use crate::service::{invalidate_students, read_through};

#[derive(Clone)]
pub struct GroupService {
    cache: Arc<ServiceCache>,
    repo: Arc<Repository>,
}

impl GroupService {
    pub fn new(cache: Arc<ServiceCache>, repo: Arc<Repository>) -> Self {
        Self { cache, repo }
    }

    /// Lists groups. A name pattern takes precedence over sorting.
    pub fn read_groups(&self, query: &GroupQuery) -> Result<Vec<Group>> {
        let key = CacheKey::Groups {
            name_pattern: query.name.clone(),
            sort: query.sort,
        };
        read_through(&self.cache, key, || {
            info!(
                "Fetching groups with namePattern: {:?}, sort: {:?}",
                query.name, query.sort
            );
            Ok(self.repo.find_groups(query.name.as_deref(), query.sort))
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Group> {
        read_through(&self.cache, CacheKey::Group(id), || {
            info!("Fetching group by ID: {}", id);
            self.repo
                .find_group(id)
                .ok_or_else(|| AppError::NotFound(format!("Group not found with id: {}", id)))
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Group> {
        read_through(&self.cache, CacheKey::GroupByName(name.to_string()), || {
            info!("Fetching group by name: {}", name);
            self.repo.find_group_by_name(name).ok_or_else(|| {
                AppError::NotFound(format!("Group not found with name: {}", name))
            })
        })
    }

    /// Creates a group and moves the listed students into it.
    pub fn add_group(&self, new: NewGroup) -> Result<Group> {
        if let Some(msg) = validate_name(&new.name) {
            return Err(AppError::InvalidRequest(msg));
        }
        info!("Adding new group: {}", new.name);
        let group = self.repo.insert_group(new.name, &new.student_ids)?;

        self.cache.invalidate_family(&KeyFamily::Groups);
        if !group.student_ids.is_empty() {
            invalidate_students(&self.cache);
        }
        self.cache
            .put(CacheKey::Group(group.id), group.clone().into_cached());
        self.cache.put(
            CacheKey::GroupByName(group.name.clone()),
            group.clone().into_cached(),
        );
        Ok(group)
    }

    pub fn delete_group(&self, id: i64) -> Result<()> {
        info!("Deleting group with ID: {}", id);
        let group = self
            .repo
            .delete_group(id)
            .ok_or_else(|| AppError::NotFound(format!("Group with ID {} not found", id)))?;
        self.evict(&group);
        Ok(())
    }

    pub fn delete_group_by_name(&self, name: &str) -> Result<()> {
        info!("Deleting group with name: {}", name);
        let group = self
            .repo
            .find_group_by_name(name)
            .and_then(|group| self.repo.delete_group(group.id))
            .ok_or_else(|| AppError::NotFound(format!("Group with name {} not found", name)))?;
        self.evict(&group);
        Ok(())
    }

    fn evict(&self, group: &Group) {
        self.cache.remove(&CacheKey::Group(group.id));
        self.cache.remove(&CacheKey::GroupByName(group.name.clone()));
        self.cache.invalidate_family(&KeyFamily::Groups);
        // Former members are now ungrouped.
        invalidate_students(&self.cache);
    }
}
