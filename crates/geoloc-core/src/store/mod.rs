// crates/geoloc-core/src/store/mod.rs

//! # Geo Store
//!
//! The persistence contract the importer and the query service depend on.
//! Geospatial search itself is delegated to the backing engine: MongoDB's
//! `2dsphere` index in production, an R-tree in [`MemoryStore`].

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::model::Location;
use async_trait::async_trait;
use std::sync::Arc;

mod memory;
#[cfg(feature = "mongo")]
mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

/// Indexes a store maintains for its location collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKind {
    /// Spherical point index on the location field.
    Geo,
    /// Full-text index over name and region.
    Text,
}

#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Bulk insert. No deduplication; an empty slice is a no-op.
    async fn insert_batch(&self, locations: &[Location]) -> Result<()>;

    /// Exact match on the stored (normalized) name, optionally restricted to
    /// one region. When several records match, the most populous wins.
    async fn query_by_name(&self, name: &str, region: Option<&str>) -> Result<Option<Location>>;

    /// Every location within `max_distance_km` of the point, closest first.
    async fn query_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<Location>>;

    /// Full-text search over name and region, best match first.
    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Location>>;

    /// Creates the geo index. Safe to call when it already exists.
    async fn ensure_geo_index(&self) -> Result<()>;

    /// Creates the text index. Safe to call when it already exists.
    async fn ensure_text_index(&self) -> Result<()>;

    /// Drops every stored location and recreates both indexes.
    async fn reset_collection(&self) -> Result<()>;

    async fn count(&self) -> Result<u64>;
}

/// Builds the store selected by `config.backend`.
///
/// For MongoDB this connects and pings the server, so an unreachable
/// database surfaces here rather than on the first request.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn GeoStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match &config.snapshot {
                Some(path) => MemoryStore::open(path)?,
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongo")]
        StoreBackend::Mongo => Ok(Arc::new(MongoStore::connect(config).await?)),
        #[cfg(not(feature = "mongo"))]
        StoreBackend::Mongo => Err(crate::error::GeoError::Config(
            "MongoDB backend requires the 'mongo' feature".into(),
        )),
    }
}
