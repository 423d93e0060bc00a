//! School registration and proximity listing.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{AppError, StoreError, DUPLICATE_SCHOOL_MESSAGE};
use crate::geo::{distance_km, Coordinates};
use crate::metrics;
use crate::store::{School, SchoolStore};
use crate::validation::NewSchool;

/// A school paired with its distance from a reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSchool {
    /// The stored school.
    pub school: School,
    /// Unrounded great-circle distance in kilometers.
    pub distance_km: f64,
}

/// Attach distances from `origin` and order nearest-first.
///
/// The sort is stable, so equal distances keep their input order.
pub fn rank_by_distance(origin: Coordinates, schools: Vec<School>) -> Vec<RankedSchool> {
    let mut ranked: Vec<RankedSchool> = schools
        .into_iter()
        .map(|school| RankedSchool {
            distance_km: distance_km(origin, school.location()),
            school,
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// School operations over an injected store.
#[derive(Debug, Clone)]
pub struct SchoolService {
    store: Arc<dyn SchoolStore>,
}

impl SchoolService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn SchoolStore> {
        &self.store
    }

    /// Register a validated school and return its id.
    ///
    /// An existing (name, address) pair is a conflict, whether the
    /// pre-check sees it or the unique index catches a concurrent insert.
    #[instrument(skip(self, school), fields(name = %school.name))]
    pub async fn add_school(&self, school: &NewSchool) -> Result<i64, AppError> {
        if self
            .store
            .duplicate_exists(&school.name, &school.address)
            .await?
        {
            metrics::inc_duplicates_rejected();
            return Err(AppError::Conflict(DUPLICATE_SCHOOL_MESSAGE.to_string()));
        }

        match self.store.insert_school(school).await {
            Ok(id) => {
                metrics::inc_schools_added();
                info!(id, "school added");
                Ok(id)
            }
            Err(StoreError::Duplicate) => {
                warn!("duplicate caught by unique index");
                metrics::inc_duplicates_rejected();
                Err(StoreError::Duplicate.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// All schools ranked by distance from `origin`.
    #[instrument(skip(self))]
    pub async fn list_by_proximity(&self, origin: Coordinates) -> Result<Vec<RankedSchool>, AppError> {
        let schools = self.store.list_schools().await?;
        metrics::inc_list_requests();
        Ok(rank_by_distance(origin, schools))
    }
}
