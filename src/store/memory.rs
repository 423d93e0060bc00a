//! In-memory school store.
//!
//! Backs the router tests and `serve --in-memory`, so the API can run
//! without a database.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{School, SchoolStore};
use crate::error::StoreError;
use crate::validation::NewSchool;

/// School store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySchoolStore {
    rows: RwLock<Vec<School>>,
    /// When set, every operation fails as if the database were down.
    unavailable: AtomicBool,
}

impl InMemorySchoolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a database outage (or recovery).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SchoolStore for InMemorySchoolStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn duplicate_exists(&self, name: &str, address: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows.iter().any(|s| s.name == name && s.address == address))
    }

    async fn insert_school(&self, school: &NewSchool) -> Result<i64, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;

        if rows
            .iter()
            .any(|s| s.name == school.name && s.address == school.address)
        {
            return Err(StoreError::Duplicate);
        }

        let id = rows.last().map_or(1, |s| s.id + 1);
        let now = OffsetDateTime::now_utc();
        rows.push(School {
            id,
            name: school.name.clone(),
            address: school.address.clone(),
            latitude: school.location.latitude,
            longitude: school.location.longitude,
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        self.check_available()?;
        Ok(self.rows.read().await.clone())
    }
}
