// crates/geoloc-api/tests/http.rs
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use geoloc_api::router;
use geoloc_core::seed::load_demo_cities;
use geoloc_core::{GeoError, GeoStore, Location, MemoryStore, QueryService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn seeded_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    load_demo_cities(store.as_ref()).await.unwrap();
    router(QueryService::new(store))
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Method::GET, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json(seeded_app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn location_lookup_returns_view() {
    let (status, body) = get_json(seeded_app().await, "/location/Bras%C3%ADlia?estado=DF").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"municipio": "Brasília", "estado": "DF", "latitude": -15.7801, "longitude": -47.9292})
    );
}

#[tokio::test]
async fn location_lookup_normalizes_inputs() {
    let (status, body) =
        get_json(seeded_app().await, "/location/BELO%20HORIZONTE?estado=mg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["municipio"], "Belo Horizonte");

    // Empty estado means no filter.
    let (status, _) = get_json(seeded_app().await, "/location/recife?estado=").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_location_is_404_with_json_body() {
    let (status, body) = get_json(seeded_app().await, "/location/Nowhereville").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].is_string());

    let (status, _) = get_json(seeded_app().await, "/location/Bras%C3%ADlia?estado=SP").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn undecodable_path_is_400_with_json_body() {
    let (status, headers, body) = send(seeded_app().await, Method::GET, "/location/%FF").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers["content-type"], "application/json");
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("UTF-8"));
}

#[tokio::test]
async fn unknown_route_and_method_use_json_body() {
    let (status, body) = get_json(seeded_app().await, "/cidades").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    let (status, _, body) = send(seeded_app().await, Method::POST, "/search?q=rio").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Method Not Allowed");
}

#[tokio::test]
async fn nearby_one_km_is_only_sao_paulo() {
    let (status, body) =
        get_json(seeded_app().await, "/nearby?lat=-23.5505&lon=-46.6333&distance=1").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["municipio"], "São Paulo");
}

#[tokio::test]
async fn nearby_large_radius_returns_all_in_distance_order() {
    let (status, body) =
        get_json(seeded_app().await, "/nearby?lat=-23.5505&lon=-46.6333&distance=9999").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 30);
    assert_eq!(items[0]["municipio"], "São Paulo");
    assert_eq!(items[29]["municipio"], "Manaus");
}

#[tokio::test]
async fn nearby_defaults_to_fifty_km() {
    let (status, body) = get_json(seeded_app().await, "/nearby?lat=-23.5505&lon=-46.6333").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["municipio"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Guarulhos"));
    assert!(!names.contains(&"Campinas"));
}

#[tokio::test]
async fn nearby_rejects_bad_parameters() {
    for uri in [
        "/nearby?lat=abc&lon=10",
        "/nearby?lon=10",
        "/nearby?lat=&lon=10",
        "/nearby?lat=1&lon=2&distance=far",
        "/nearby?lat=95&lon=2",
        "/nearby?lat=1&lon=2&distance=-5",
    ] {
        let (status, body) = get_json(seeded_app().await, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Bad Request");
    }
}

#[tokio::test]
async fn search_ranks_best_match_first() {
    let (status, body) = get_json(seeded_app().await, "/search?q=sao%20luis&limit=3").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert!(items.len() <= 3);
    assert_eq!(items[0]["municipio"], "São Luís");

    let (status, _) = get_json(seeded_app().await, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(seeded_app().await, "/search?q=rio&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn options_is_answered_with_empty_200_and_cors_headers() {
    let (status, headers, body) = send(seeded_app().await, Method::OPTIONS, "/nearby").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");

    let (_, headers, _) = send(seeded_app().await, Method::GET, "/health").await;
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn store_errors_become_generic_500() {
    // No index: the memory store refuses radius queries.
    let app = router(QueryService::new(Arc::new(MemoryStore::new())));
    let (status, body) = get_json(app, "/nearby?lat=-10&lon=-40").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(!body["message"].as_str().unwrap().contains("2dsphere"));
}

struct BrokenStore;

#[async_trait::async_trait]
impl GeoStore for BrokenStore {
    async fn insert_batch(&self, _: &[Location]) -> geoloc_core::Result<()> {
        Ok(())
    }
    async fn query_by_name(&self, _: &str, _: Option<&str>) -> geoloc_core::Result<Option<Location>> {
        Err(GeoError::InvalidData("location has no valid coordinates".into()))
    }
    async fn query_near(&self, _: f64, _: f64, _: f64) -> geoloc_core::Result<Vec<Location>> {
        Ok(Vec::new())
    }
    async fn search_text(&self, _: &str, _: usize) -> geoloc_core::Result<Vec<Location>> {
        Ok(Vec::new())
    }
    async fn ensure_geo_index(&self) -> geoloc_core::Result<()> {
        Ok(())
    }
    async fn ensure_text_index(&self) -> geoloc_core::Result<()> {
        Ok(())
    }
    async fn reset_collection(&self) -> geoloc_core::Result<()> {
        Ok(())
    }
    async fn count(&self) -> geoloc_core::Result<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn undecodable_record_is_500() {
    let app = router(QueryService::new(Arc::new(BrokenStore)));
    let (status, body) = get_json(app, "/location/Recife").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["message"].as_str().unwrap().contains("coordinates"));
}
