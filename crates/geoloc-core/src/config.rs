// crates/geoloc-core/src/config.rs

//! # Configuration
//!
//! One [`AppConfig`] is built at startup (defaults, then an optional TOML
//! file, then CLI/environment overrides) and handed to the constructors that
//! need it. Nothing here is global.
//!
//! ```toml
//! [store]
//! backend = "mongo"
//! uri = "mongodb://localhost:27017"
//! database = "geolocalizacao_br"
//! collection = "localizacoes"
//!
//! [import]
//! country_code = "BR"
//! batch_size = 1000
//!
//! [import.bounds]
//! min_lat = -33.8
//! max_lat = 5.4
//! min_lon = -74.0
//! max_lon = -28.7
//!
//! [server]
//! port = 8080
//! query_timeout_secs = 5
//! ```

use crate::error::{GeoError, Result};
use crate::model::BoundingBox;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// -----------------------------------------------------------------------------
// DEFAULTS
// -----------------------------------------------------------------------------

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "geolocalizacao_br";
pub const DEFAULT_COLLECTION: &str = "localizacoes";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_COUNTRY: &str = "BR";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const GEONAMES_DUMP_URL: &str = "http://download.geonames.org/export/dump/BR.zip";

// -----------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub import: ImportConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Reads a TOML file. Missing sections and keys fall back to defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GeoError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            return Err(GeoError::Config("import.batch_size must be > 0".into()));
        }
        let b = &self.import.bounds;
        if b.min_lat > b.max_lat || b.min_lon > b.max_lon {
            return Err(GeoError::Config(format!(
                "import.bounds is empty: {b:?}"
            )));
        }
        if self.store.collection.is_empty() || self.store.database.is_empty() {
            return Err(GeoError::Config(
                "store.database and store.collection must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            query: Duration::from_secs(self.server.query_timeout_secs),
            admin: Duration::from_secs(self.server.admin_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(GeoError::Config(format!("unknown store backend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Snapshot file for the memory backend.
    pub snapshot: Option<PathBuf>,
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongo,
            uri: DEFAULT_MONGO_URI.to_owned(),
            database: DEFAULT_DATABASE.to_owned(),
            collection: DEFAULT_COLLECTION.to_owned(),
            snapshot: None,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows whose country column differs are rejected in full mode.
    pub country_code: String,
    pub bounds: BoundingBox,
    pub batch_size: usize,
    pub dataset_url: String,
    /// Where the downloaded archive and its extracted files are written.
    pub download_dir: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY.to_owned(),
            bounds: BoundingBox::BRAZIL,
            batch_size: DEFAULT_BATCH_SIZE,
            dataset_url: GEONAMES_DUMP_URL.to_owned(),
            download_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub query_timeout_secs: u64,
    pub admin_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            query_timeout_secs: 5,
            admin_timeout_secs: 30,
        }
    }
}

/// Deadlines applied around store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Lookups issued on behalf of HTTP requests.
    pub query: Duration,
    /// Index creation, collection resets and batch inserts.
    pub admin: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(5),
            admin: Duration::from_secs(30),
        }
    }
}
