// crates/geoloc-api/src/handlers.rs
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use geoloc_core::service::DEFAULT_NEARBY_KM;
use geoloc_core::{
    normalize_municipio, normalize_region, GeoError, GeoPoint, Location, LocationView,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Extractor results are taken as `Result` so rejections keep the JSON error
/// body instead of axum's plain-text one.
type Params = Result<Query<HashMap<String, String>>, QueryRejection>;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "API de Geolocalização Brasil está funcionando!",
    })
}

/// `GET /location/:municipio?estado=XX`
pub async fn location_by_name(
    State(state): State<AppState>,
    municipio: Result<Path<String>, PathRejection>,
    params: Params,
) -> ApiResult<Json<LocationView>> {
    let Path(municipio) = municipio?;
    let Query(params) = params?;
    let name = normalize_municipio(&municipio);
    let estado = params
        .get("estado")
        .map(|s| normalize_region(s))
        .filter(|s| !s.is_empty());

    let found = state
        .service
        .location_by_name(&name, estado.as_deref())
        .await
        .map_err(|e| store_failure(e, "Erro ao buscar localização"))?;

    match found {
        Some(loc) => Ok(Json(LocationView::from(&loc))),
        None => Err(ApiError::not_found("Localização não encontrada")),
    }
}

/// `GET /nearby?lat=..&lon=..&distance=..` (distance in km, default 50)
pub async fn nearby(
    State(state): State<AppState>,
    params: Params,
) -> ApiResult<Json<Vec<LocationView>>> {
    let Query(params) = params?;
    let (Some(lat), Some(lon)) = (param(&params, "lat"), param(&params, "lon")) else {
        return Err(ApiError::bad_request("Parâmetros lat e lon são obrigatórios"));
    };
    let lat: f64 = lat
        .parse()
        .map_err(|_| ApiError::bad_request("Latitude inválida"))?;
    let lon: f64 = lon
        .parse()
        .map_err(|_| ApiError::bad_request("Longitude inválida"))?;
    let distance = match param(&params, "distance") {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| ApiError::bad_request("Distância inválida"))?,
        None => DEFAULT_NEARBY_KM,
    };
    if GeoPoint::new(lon, lat).is_err() {
        return Err(ApiError::bad_request("Coordenadas fora do intervalo válido"));
    }
    if !distance.is_finite() || distance < 0.0 {
        return Err(ApiError::bad_request("Distância inválida"));
    }

    let found = state
        .service
        .nearby(lat, lon, distance)
        .await
        .map_err(|e| store_failure(e, "Erro ao buscar localizações"))?;
    Ok(Json(views(&found)))
}

/// `GET /search?q=..&limit=..`
pub async fn search(
    State(state): State<AppState>,
    params: Params,
) -> ApiResult<Json<Vec<LocationView>>> {
    let Query(params) = params?;
    let Some(query) = param(&params, "q") else {
        return Err(ApiError::bad_request("Parâmetro q é obrigatório"));
    };
    let limit = match param(&params, "limit") {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=MAX_SEARCH_LIMIT).contains(&n) => n,
            _ => {
                return Err(ApiError::bad_request(format!(
                    "limit deve estar entre 1 e {MAX_SEARCH_LIMIT}"
                )))
            }
        },
        None => DEFAULT_SEARCH_LIMIT,
    };

    let found = state
        .service
        .search(query, limit)
        .await
        .map_err(|e| store_failure(e, "Erro ao buscar localizações"))?;
    Ok(Json(views(&found)))
}

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Rota não encontrada")
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Método não permitido")
}

// --- helpers -------------------------------------------------------------

/// Query parameter, with empty values treated as absent.
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn views(locations: &[Location]) -> Vec<LocationView> {
    locations.iter().map(LocationView::from).collect()
}

/// Logs the real cause and hands the client a generic 500.
fn store_failure(err: GeoError, message: &'static str) -> ApiError {
    error!(error = %err, "{message}");
    ApiError::internal(message)
}
