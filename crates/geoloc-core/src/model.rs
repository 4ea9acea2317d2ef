// crates/geoloc-core/src/model.rs
use crate::error::{GeoError, Result};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// A WGS84 point. Stored as GeoJSON with coordinates in `[lon, lat]` order.
///
/// Construct through [`GeoPoint::new`], which rejects non-finite values and
/// values outside lon ∈ [-180, 180], lat ∈ [-90, 90]. Deserialization goes
/// through the same check, so a stored document with missing or broken
/// coordinates fails to decode instead of producing a bogus point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoJsonPoint", into = "GeoJsonPoint")]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        let valid = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        if !valid {
            return Err(GeoError::InvalidPoint { lon, lat });
        }
        Ok(Self { lon, lat })
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two points on a sphere of radius
/// [`EARTH_RADIUS_KM`].
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let half_dlat = (b.lat - a.lat).to_radians() * 0.5;
    let half_dlon = (b.lon - a.lon).to_radians() * 0.5;

    let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Wire form of [`GeoPoint`]: `{"type": "Point", "coordinates": [lon, lat]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: GeoJsonPoint) -> Result<Self> {
        if raw.kind != "Point" {
            return Err(GeoError::InvalidData(format!(
                "expected GeoJSON Point, got '{}'",
                raw.kind
            )));
        }
        match raw.coordinates.as_slice() {
            [lon, lat, ..] => GeoPoint::new(*lon, *lat),
            _ => Err(GeoError::InvalidData(
                "location has no valid coordinates".into(),
            )),
        }
    }
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(p: GeoPoint) -> Self {
        Self {
            kind: "Point".to_owned(),
            coordinates: vec![p.lon, p.lat],
        }
    }
}

/// A municipality as persisted in the store.
///
/// Field names on the wire match the existing `localizacoes` collection
/// layout (`municipio`, `estado`, `localizacao`, `populacao`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "municipio")]
    pub name: String,
    /// Two-letter state code, e.g. `"SP"`.
    #[serde(rename = "estado")]
    pub region: String,
    #[serde(rename = "localizacao")]
    pub point: GeoPoint,
    #[serde(rename = "populacao", default, skip_serializing_if = "is_zero")]
    pub population: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Location {
    pub fn new(name: impl Into<String>, region: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            point,
            population: 0,
        }
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }
}

/// Public JSON view returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    pub municipio: String,
    pub estado: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Location> for LocationView {
    fn from(loc: &Location) -> Self {
        Self {
            municipio: loc.name.clone(),
            estado: loc.region.clone(),
            latitude: loc.point.lat(),
            longitude: loc.point.lon(),
        }
    }
}

/// Inclusive latitude/longitude rectangle used as a coarse sanity filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Mainland Brazil plus its Atlantic islands, with a small margin.
    pub const BRAZIL: BoundingBox = BoundingBox {
        min_lat: -33.8,
        max_lat: 5.4,
        min_lon: -74.0,
        max_lon: -28.7,
    };

    /// Takes raw values so callers can check before building a [`GeoPoint`];
    /// `NaN` is never inside.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::BRAZIL
    }
}
