// crates/geoloc-core/src/store/memory.rs
use super::{GeoStore, IndexKind};
use crate::error::{GeoError, Result};
use crate::loader::common_io;
use crate::model::{GeoPoint, Location, EARTH_RADIUS_KM};
use crate::text::fold_terms;
use async_trait::async_trait;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// R-tree entry: `[lon, lat]` plus the position of the location in `records`.
type PointEntry = GeomWithData<[f64; 2], usize>;

/// In-process [`GeoStore`] used by tests, demos and the `memory` CLI backend.
///
/// Records are kept in insertion order, which is also the tie-break order
/// for equal populations and equal distances. The geo index is an R-tree
/// over `[lon, lat]`; the text index maps folded terms to record positions.
/// Like MongoDB, radius and text queries fail until their index exists.
///
/// With a snapshot path every mutation rewrites the snapshot file
/// (bincode, gzip when the path ends in `.gz`).
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    snapshot: Option<PathBuf>,
}

#[derive(Default)]
struct State {
    records: Vec<Location>,
    geo: Option<RTree<PointEntry>>,
    text: Option<HashMap<String, Vec<usize>>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    name: String,
    region: String,
    lon: f64,
    lat: f64,
    population: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a snapshot-backed store, loading the file when it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let records = if path.exists() {
            let records = load_snapshot(path)?;
            info!(path = %path.display(), records = records.len(), "loaded memory store snapshot");
            records
        } else {
            Vec::new()
        };

        Ok(Self {
            state: RwLock::new(State {
                records,
                ..State::default()
            }),
            snapshot: Some(path.to_path_buf()),
        })
    }

    /// Indexes currently built, in a stable order.
    pub fn indexes(&self) -> Result<Vec<IndexKind>> {
        let state = self.read()?;
        let mut out = Vec::new();
        if state.geo.is_some() {
            out.push(IndexKind::Geo);
        }
        if state.text.is_some() {
            out.push(IndexKind::Text);
        }
        Ok(out)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| GeoError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| GeoError::LockPoisoned)
    }

    /// Rewrites the snapshot file, if any, from `records`.
    ///
    /// Callers hold the write lock, so snapshot writes never interleave and
    /// the last rename always carries the newest state.
    fn persist(&self, records: &[Location]) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let records: Vec<SnapshotRecord> = records
            .iter()
            .map(|loc| SnapshotRecord {
                name: loc.name.clone(),
                region: loc.region.clone(),
                lon: loc.point.lon(),
                lat: loc.point.lat(),
                population: loc.population,
            })
            .collect();

        // Write next to the target and rename, so readers never see half a file.
        let tmp = path.with_extension("tmp");
        {
            let mut out = common_io::create_stream(&tmp, common_io::is_gzip_path(path))?;
            bincode::serialize_into(&mut out, &records)?;
            out.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), records = records.len(), "snapshot written");
        Ok(())
    }
}

impl State {
    fn build_geo(&self) -> RTree<PointEntry> {
        RTree::bulk_load(
            self.records
                .iter()
                .enumerate()
                .map(|(idx, loc)| point_entry(loc, idx))
                .collect(),
        )
    }

    fn build_text(&self) -> HashMap<String, Vec<usize>> {
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, loc) in self.records.iter().enumerate() {
            index_terms(&mut postings, loc, idx);
        }
        postings
    }
}

fn point_entry(loc: &Location, idx: usize) -> PointEntry {
    GeomWithData::new([loc.point.lon(), loc.point.lat()], idx)
}

fn index_terms(postings: &mut HashMap<String, Vec<usize>>, loc: &Location, idx: usize) {
    let terms: HashSet<String> = fold_terms(&loc.name)
        .into_iter()
        .chain(fold_terms(&loc.region))
        .collect();
    for term in terms {
        postings.entry(term).or_default().push(idx);
    }
}

/// Lon/lat rectangle that contains every point within `radius_km` of `center`.
fn search_envelope(center: &GeoPoint, radius_km: f64) -> AABB<[f64; 2]> {
    // Degrees of arc per km on the sphere, padded slightly.
    let dlat = (radius_km / EARTH_RADIUS_KM).to_degrees() * 1.01;
    let min_lat = (center.lat() - dlat).max(-90.0);
    let max_lat = (center.lat() + dlat).min(90.0);

    let widest = min_lat.abs().max(max_lat.abs());
    let (min_lon, max_lon) = if widest >= 89.9 {
        (-180.0, 180.0)
    } else {
        let dlon = dlat / widest.to_radians().cos();
        if dlon >= 180.0 || center.lon() - dlon < -180.0 || center.lon() + dlon > 180.0 {
            (-180.0, 180.0)
        } else {
            (center.lon() - dlon, center.lon() + dlon)
        }
    };

    AABB::from_corners([min_lon, min_lat], [max_lon, max_lat])
}

fn load_snapshot(path: &Path) -> Result<Vec<Location>> {
    let reader = common_io::open_stream(path)?;
    let raw: Vec<SnapshotRecord> = bincode::deserialize_from(reader)?;
    raw.into_iter()
        .map(|r| {
            let point = GeoPoint::new(r.lon, r.lat)?;
            Ok(Location::new(r.name, r.region, point).with_population(r.population))
        })
        .collect()
}

#[async_trait]
impl GeoStore for MemoryStore {
    async fn insert_batch(&self, locations: &[Location]) -> Result<()> {
        if locations.is_empty() {
            return Ok(());
        }

        let mut state = self.write()?;
        let state = &mut *state;
        let before = state.records.len();
        state.records.extend_from_slice(locations);

        // The snapshot must hold the batch before the indexes see it.
        if let Err(e) = self.persist(&state.records) {
            state.records.truncate(before);
            return Err(e);
        }

        for (idx, loc) in state.records.iter().enumerate().skip(before) {
            if let Some(geo) = state.geo.as_mut() {
                geo.insert(point_entry(loc, idx));
            }
            if let Some(text) = state.text.as_mut() {
                index_terms(text, loc, idx);
            }
        }
        Ok(())
    }

    async fn query_by_name(&self, name: &str, region: Option<&str>) -> Result<Option<Location>> {
        let state = self.read()?;
        let mut best: Option<&Location> = None;
        for loc in state
            .records
            .iter()
            .filter(|l| l.name == name && region.map_or(true, |r| l.region == r))
        {
            // Strict '>' keeps the earliest record on population ties.
            if best.map_or(true, |b| loc.population > b.population) {
                best = Some(loc);
            }
        }
        Ok(best.cloned())
    }

    async fn query_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<Location>> {
        let center = GeoPoint::new(longitude, latitude)?;
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(GeoError::InvalidData(format!(
                "max distance must be a non-negative number, got {max_distance_km}"
            )));
        }

        let state = self.read()?;
        let geo = state.geo.as_ref().ok_or(GeoError::IndexMissing("2dsphere"))?;

        let mut hits: Vec<(f64, usize)> = geo
            .locate_in_envelope(&search_envelope(&center, max_distance_km))
            .filter_map(|entry| {
                let loc = &state.records[entry.data];
                let d = center.distance_km(&loc.point);
                (d <= max_distance_km).then_some((d, entry.data))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(hits
            .into_iter()
            .map(|(_, idx)| state.records[idx].clone())
            .collect())
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Location>> {
        let state = self.read()?;
        let text = state.text.as_ref().ok_or(GeoError::IndexMissing("text"))?;

        let mut scores: HashMap<usize, usize> = HashMap::new();
        let terms: HashSet<String> = fold_terms(query).into_iter().collect();
        for term in &terms {
            if let Some(ids) = text.get(term) {
                for &idx in ids {
                    *scores.entry(idx).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(usize, usize)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| {
                    state.records[b.0]
                        .population
                        .cmp(&state.records[a.0].population)
                })
                .then(a.0.cmp(&b.0))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(idx, _)| state.records[idx].clone())
            .collect())
    }

    async fn ensure_geo_index(&self) -> Result<()> {
        let mut state = self.write()?;
        if state.geo.is_none() {
            state.geo = Some(state.build_geo());
            debug!(records = state.records.len(), "geo index built");
        }
        Ok(())
    }

    async fn ensure_text_index(&self) -> Result<()> {
        let mut state = self.write()?;
        if state.text.is_none() {
            state.text = Some(state.build_text());
            debug!(records = state.records.len(), "text index built");
        }
        Ok(())
    }

    async fn reset_collection(&self) -> Result<()> {
        let mut state = self.write()?;
        self.persist(&[])?;
        *state = State {
            records: Vec::new(),
            geo: Some(RTree::new()),
            text: Some(HashMap::new()),
        };
        info!("memory store reset");
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.records.len() as u64)
    }
}
