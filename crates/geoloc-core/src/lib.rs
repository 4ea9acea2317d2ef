// crates/geoloc-core/src/lib.rs

pub mod config;
pub mod error;
pub mod loader; // GeoNames TSV importer (+ download when "fetch" is on)
pub mod model;
pub mod regions; // admin1 -> state code table
pub mod seed;
pub mod service;
pub mod store;
pub mod text;

// Re-exports
pub use crate::config::{AppConfig, ImportConfig, ServerConfig, StoreBackend, StoreConfig, Timeouts};
pub use crate::error::{GeoError, Result};
pub use crate::loader::{ImportMode, ImportReport, Importer};
pub use crate::model::{BoundingBox, GeoPoint, Location, LocationView};
pub use crate::service::QueryService;
// Export the store trait (needed to call store methods directly)
pub use crate::store::{open_store, GeoStore, IndexKind, MemoryStore};
#[cfg(feature = "mongo")]
pub use crate::store::MongoStore;
pub use crate::text::{normalize_municipio, normalize_region};
