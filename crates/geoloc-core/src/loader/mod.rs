// crates/geoloc-core/src/loader/mod.rs

//! # Record Importer
//!
//! Reads GeoNames `geoname` dumps (tab-separated, one place per row),
//! validates each row, normalizes the accepted ones and commits them to a
//! [`GeoStore`] in fixed-size batches.
//!
//! Rejected rows never abort the import; each validation stage has its own
//! counter in the returned [`ImportReport`]. Only an unreadable source or a
//! failing store aborts, and batches flushed before the failure stay
//! committed.

use crate::config::{ImportConfig, Timeouts};
use crate::error::{GeoError, Result};
use crate::model::{GeoPoint, Location};
use crate::regions;
use crate::store::GeoStore;
use crate::text::normalize_municipio;
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub mod common_io;
#[cfg(feature = "fetch")]
pub mod fetch;

// -----------------------------------------------------------------------------
// GEONAMES LAYOUT
// -----------------------------------------------------------------------------

const COL_NAME: usize = 1;
const COL_LATITUDE: usize = 4;
const COL_LONGITUDE: usize = 5;
const COL_COUNTRY: usize = 8;
const COL_ADMIN1: usize = 10;
const COL_POPULATION: usize = 14;
/// Rows with fewer columns are treated as malformed.
pub const MIN_FIELDS: usize = 18;
/// Parsed batches allowed to wait for the store.
const BATCH_QUEUE: usize = 2;

// -----------------------------------------------------------------------------
// CONFIGURATION
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Country filter, admin1 resolution and bounding-box check.
    #[default]
    Full,
    /// For pre-cleaned sources: the region column is stored verbatim and no
    /// country, region-table or bounding-box filtering happens.
    Simple,
}

/// Counters collected while importing one source.
///
/// `processed` counts every data row (header excluded) and always equals
/// `malformed + rejected() + accepted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub processed: u64,
    pub malformed: u64,
    pub rejected_country: u64,
    pub rejected_region_missing: u64,
    pub rejected_region_unknown: u64,
    pub rejected_coordinates: u64,
    pub rejected_bounds: u64,
    pub accepted: u64,
    /// Number of `insert_batch` calls issued.
    pub batches: u64,
}

impl ImportReport {
    pub fn rejected(&self) -> u64 {
        self.rejected_country
            + self.rejected_region_missing
            + self.rejected_region_unknown
            + self.rejected_coordinates
            + self.rejected_bounds
    }

    fn log(&self) {
        info!(
            accepted = self.accepted,
            batches = self.batches,
            "import finished"
        );
        info!(
            processed = self.processed,
            malformed = self.malformed,
            rejected_country = self.rejected_country,
            rejected_region_missing = self.rejected_region_missing,
            rejected_region_unknown = self.rejected_region_unknown,
            rejected_coordinates = self.rejected_coordinates,
            rejected_bounds = self.rejected_bounds,
            "rejection statistics"
        );
    }
}

/// Why a single row was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    Country,
    RegionMissing,
    RegionUnknown,
    Coordinates,
    Bounds,
}

// -----------------------------------------------------------------------------
// IMPORTER
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Importer {
    config: ImportConfig,
    mode: ImportMode,
    insert_timeout: Duration,
}

impl Importer {
    pub fn new(config: ImportConfig, mode: ImportMode) -> Self {
        Self {
            config,
            mode,
            insert_timeout: Timeouts::default().admin,
        }
    }

    /// Deadline for each `insert_batch` call.
    pub fn with_insert_timeout(mut self, timeout: Duration) -> Self {
        self.insert_timeout = timeout;
        self
    }

    /// Imports a file; `*.gz` files are decompressed on the fly.
    pub async fn import_path(
        &self,
        path: impl AsRef<Path>,
        store: &dyn GeoStore,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        info!(path = %path.display(), mode = ?self.mode, "importing GeoNames file");
        let reader = common_io::open_stream(path)?;
        self.import_reader(reader, store).await
    }

    /// Imports every row of `reader`. The first row is a header and is skipped.
    ///
    /// Reading and parsing run on a blocking thread; full batches are handed
    /// over a bounded channel and inserted here, one at a time and in order.
    pub async fn import_reader<R>(&self, reader: R, store: &dyn GeoStore) -> Result<ImportReport>
    where
        R: Read + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Vec<Location>>(BATCH_QUEUE);
        let parser = self.clone();
        let producer = tokio::task::spawn_blocking(move || parser.read_batches(reader, &tx));

        let mut batches = 0u64;
        let mut failure = None;
        while let Some(batch) = rx.recv().await {
            if let Err(e) = self.insert(store, &batch).await {
                warn!(error = %e, committed_batches = batches, "batch insert failed");
                failure = Some(e);
                break;
            }
            batches += 1;
            debug!(size = batch.len(), batches, "batch committed");
        }
        // Closing the channel stops a reader that is still ahead of us.
        drop(rx);

        let parsed = producer.await?;
        if let Some(e) = failure {
            return Err(e);
        }
        let mut report = parsed?;
        report.batches = batches;
        report.log();
        Ok(report)
    }

    /// Blocking half of the import: parses rows and sends full batches.
    /// Stops early, without error, once the receiving side has gone away.
    fn read_batches<R: Read>(
        &self,
        reader: R,
        tx: &mpsc::Sender<Vec<Location>>,
    ) -> Result<ImportReport> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let batch_size = self.config.batch_size.max(1);
        let mut report = ImportReport::default();
        let mut batch: Vec<Location> = Vec::with_capacity(batch_size);
        let mut record = StringRecord::new();

        loop {
            match rdr.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    // Undecodable row (e.g. invalid UTF-8): skip it.
                    warn!(error = %e, "skipping unreadable row");
                    report.processed += 1;
                    report.malformed += 1;
                    continue;
                }
            }

            report.processed += 1;
            match self.parse_record(&record) {
                Ok(location) => {
                    report.accepted += 1;
                    batch.push(location);
                    if batch.len() >= batch_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                        if tx.blocking_send(full).is_err() {
                            return Ok(report);
                        }
                    }
                }
                Err(rejection) => report.count(rejection),
            }
        }

        if !batch.is_empty() && tx.blocking_send(batch).is_err() {
            return Ok(report);
        }
        Ok(report)
    }

    async fn insert(&self, store: &dyn GeoStore, batch: &[Location]) -> Result<()> {
        match tokio::time::timeout(self.insert_timeout, store.insert_batch(batch)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout {
                operation: "insert_batch",
                after: self.insert_timeout,
            }),
        }
    }

    fn parse_record(&self, record: &StringRecord) -> std::result::Result<Location, Rejection> {
        if record.len() < MIN_FIELDS {
            return Err(Rejection::Malformed);
        }
        let name = field_at(record, COL_NAME);
        let raw_region = field_at(record, COL_ADMIN1);

        let country = field_at(record, COL_COUNTRY);
        if self.mode == ImportMode::Full && country != self.config.country_code {
            return Err(Rejection::Country);
        }

        if raw_region.is_empty() {
            return Err(Rejection::RegionMissing);
        }

        let region = match self.mode {
            ImportMode::Full => match regions::resolve(raw_region) {
                Some(code) => code,
                None => {
                    warn!(code = raw_region, municipio = name, "unknown admin1 code, row skipped");
                    return Err(Rejection::RegionUnknown);
                }
            },
            ImportMode::Simple => {
                if !regions::is_known_region(raw_region) {
                    debug!(estado = raw_region, municipio = name, "region stored verbatim");
                }
                raw_region
            }
        };

        let lat: f64 = field_at(record, COL_LATITUDE)
            .trim()
            .parse()
            .map_err(|_| Rejection::Coordinates)?;
        let lon: f64 = field_at(record, COL_LONGITUDE)
            .trim()
            .parse()
            .map_err(|_| Rejection::Coordinates)?;

        // Parsed but out-of-range values (lat 95.0) belong to the bounds stage.
        if self.mode == ImportMode::Full && !self.config.bounds.contains(lat, lon) {
            debug!(lat, lon, municipio = name, estado = region, "coordinates outside bounds");
            return Err(Rejection::Bounds);
        }
        let point = GeoPoint::new(lon, lat).map_err(|_| Rejection::Coordinates)?;

        let population = field_at(record, COL_POPULATION).trim().parse::<u64>().unwrap_or(0);

        Ok(Location::new(normalize_municipio(name), region, point).with_population(population))
    }
}

fn field_at(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

impl ImportReport {
    fn count(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Malformed => self.malformed += 1,
            Rejection::Country => self.rejected_country += 1,
            Rejection::RegionMissing => self.rejected_region_missing += 1,
            Rejection::RegionUnknown => self.rejected_region_unknown += 1,
            Rejection::Coordinates => self.rejected_coordinates += 1,
            Rejection::Bounds => self.rejected_bounds += 1,
        }
    }
}
