//! In-process link repository.
//!
//! Keeps every row in a map behind one async lock. Each operation holds the
//! lock for its whole check-and-write, which gives the same atomicity as the
//! PostgreSQL constraint and conditional update. Data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{LinkRepository, RepositoryError};

#[derive(Default)]
struct Store {
    links: HashMap<String, Link>,
    next_id: i64,
}

/// Link repository backed by process memory.
#[derive(Default)]
pub struct MemoryLinkRepository {
    store: RwLock<Store>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn try_insert_unique(&self, new_link: NewLink) -> Result<Link, RepositoryError> {
        let mut store = self.store.write().await;

        if store.links.contains_key(&new_link.short_code) {
            return Err(RepositoryError::Collision);
        }

        store.next_id += 1;
        let link = new_link.into_link(store.next_id);
        store.links.insert(link.short_code.clone(), link.clone());

        Ok(link)
    }

    async fn fetch_by_short_code(&self, code: &str) -> Result<Link, RepositoryError> {
        self.store
            .read()
            .await
            .links
            .get(code)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Link, RepositoryError> {
        self.store
            .read()
            .await
            .links
            .values()
            .find(|link| link.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Link>, RepositoryError> {
        let store = self.store.read().await;

        let mut links: Vec<Link> = store
            .links
            .values()
            .filter(|link| link.is_owned_by(owner_id))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(links)
    }

    async fn atomic_increment_visit(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, RepositoryError> {
        let mut store = self.store.write().await;
        let link = store.links.get_mut(code).ok_or(RepositoryError::NotFound)?;

        if link.is_expired || link.is_past_expiry(now) || link.is_exhausted() {
            return Ok(None);
        }

        link.visit_count += 1;
        Ok(Some(link.visit_count))
    }

    async fn retire(&self, code: &str) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        let link = store.links.get_mut(code).ok_or(RepositoryError::NotFound)?;

        link.is_expired = true;
        Ok(())
    }

    async fn update_original_url(
        &self,
        code: &str,
        new_url: &str,
    ) -> Result<Link, RepositoryError> {
        let mut store = self.store.write().await;
        let link = store.links.get_mut(code).ok_or(RepositoryError::NotFound)?;

        link.original_url = new_url.to_string();
        Ok(link.clone())
    }

    async fn delete(&self, code: &str) -> Result<(), RepositoryError> {
        self.store
            .write()
            .await
            .links
            .remove(code)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn retire_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut store = self.store.write().await;
        let mut retired = 0;

        for link in store.links.values_mut() {
            if !link.is_expired && link.is_past_expiry(now) {
                link.is_expired = true;
                retired += 1;
            }
        }

        Ok(retired)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
