// crates/geoloc-core/src/service.rs

//! # Query Service
//!
//! Thin layer between the HTTP handlers and a [`GeoStore`]. It owns no data;
//! it bounds every store call with a deadline and logs store failures with
//! their full cause before handing them back.

use crate::config::Timeouts;
use crate::error::{GeoError, Result};
use crate::model::Location;
use crate::store::GeoStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Default radius for `nearby` when the caller gives none.
pub const DEFAULT_NEARBY_KM: f64 = 50.0;

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn GeoStore>,
    timeouts: Timeouts,
}

impl QueryService {
    pub fn new(store: Arc<dyn GeoStore>) -> Self {
        Self::with_timeouts(store, Timeouts::default())
    }

    pub fn with_timeouts(store: Arc<dyn GeoStore>, timeouts: Timeouts) -> Self {
        Self { store, timeouts }
    }

    pub fn store(&self) -> &Arc<dyn GeoStore> {
        &self.store
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Looks up a municipality by its normalized name.
    ///
    /// `Ok(None)` means "no such place"; errors are reserved for store
    /// failures and timeouts.
    pub async fn location_by_name(
        &self,
        name: &str,
        region: Option<&str>,
    ) -> Result<Option<Location>> {
        debug!(municipio = name, estado = ?region, "location lookup");
        self.bounded(
            "query_by_name",
            self.timeouts.query,
            self.store.query_by_name(name, region),
        )
        .await
    }

    /// Locations within `max_distance_km`, nearest first.
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<Location>> {
        debug!(latitude, longitude, max_distance_km, "nearby lookup");
        self.bounded(
            "query_near",
            self.timeouts.query,
            self.store.query_near(longitude, latitude, max_distance_km),
        )
        .await
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Location>> {
        debug!(query, limit, "text search");
        self.bounded(
            "search_text",
            self.timeouts.query,
            self.store.search_text(query, limit),
        )
        .await
    }

    /// Creates the geo and text indexes; both calls are idempotent.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.bounded("ensure_geo_index", self.timeouts.admin, self.store.ensure_geo_index())
            .await?;
        self.bounded("ensure_text_index", self.timeouts.admin, self.store.ensure_text_index())
            .await
    }

    pub async fn reset(&self) -> Result<()> {
        self.bounded("reset_collection", self.timeouts.admin, self.store.reset_collection())
            .await
    }

    pub async fn count(&self) -> Result<u64> {
        self.bounded("count", self.timeouts.query, self.store.count()).await
    }

    /// Runs `fut` with a deadline. On expiry the store future is dropped,
    /// which cancels the in-flight call.
    async fn bounded<T, F>(&self, operation: &'static str, after: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let outcome = match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout { operation, after }),
        };
        if let Err(e) = &outcome {
            error!(operation, error = %e, "store call failed");
        }
        outcome
    }
}
