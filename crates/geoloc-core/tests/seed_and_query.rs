// crates/geoloc-core/tests/seed_and_query.rs
use async_trait::async_trait;
use geoloc_core::seed::load_demo_cities;
use geoloc_core::{
    normalize_municipio, GeoError, GeoPoint, GeoStore, Location, MemoryStore, QueryService,
    Result, Timeouts,
};
use std::sync::Arc;
use std::time::Duration;

async fn seeded_service() -> QueryService {
    let store = Arc::new(MemoryStore::new());
    load_demo_cities(store.as_ref()).await.unwrap();
    QueryService::new(store)
}

#[tokio::test]
async fn brasilia_lookup_returns_seeded_point() {
    let svc = seeded_service().await;
    let hit = svc
        .location_by_name(&normalize_municipio("brasília"), Some("DF"))
        .await
        .unwrap()
        .expect("Brasília is seeded");
    assert_eq!(hit.name, "Brasília");
    assert_eq!(hit.region, "DF");
    assert_eq!(hit.point.lat(), -15.7801);
    assert_eq!(hit.point.lon(), -47.9292);
}

#[tokio::test]
async fn unknown_city_is_absent_not_an_error() {
    let svc = seeded_service().await;
    assert!(svc.location_by_name("Nowhereville", None).await.unwrap().is_none());
}

#[tokio::test]
async fn one_km_radius_around_sao_paulo_is_just_sao_paulo() {
    let svc = seeded_service().await;
    let hits = svc.nearby(-23.5505, -46.6333, 1.0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "São Paulo");
}

#[tokio::test]
async fn huge_radius_returns_everything_nearest_first() {
    let svc = seeded_service().await;
    let hits = svc.nearby(-23.5505, -46.6333, 9999.0).await.unwrap();
    assert_eq!(hits.len(), 30);
    assert_eq!(hits[0].name, "São Paulo");

    let origin = GeoPoint::new(-46.6333, -23.5505).unwrap();
    let distances: Vec<f64> = hits.iter().map(|l| origin.distance_km(&l.point)).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]), "{distances:?}");
}

#[tokio::test]
async fn inserted_record_round_trips_through_lookup() {
    let svc = seeded_service().await;
    let loc = Location::new(
        normalize_municipio("FEIRA DE SANTANA"),
        "BA",
        GeoPoint::new(-38.9663, -12.2664).unwrap(),
    );
    svc.store().insert_batch(std::slice::from_ref(&loc)).await.unwrap();

    assert_eq!(loc.name, "Feira DE Santana");
    let hit = svc.location_by_name(&loc.name, Some("BA")).await.unwrap().unwrap();
    assert_eq!(hit, loc);
}

#[tokio::test]
async fn search_finds_accented_names_from_plain_query() {
    let svc = seeded_service().await;
    let hits = svc.search("sao goncalo", 5).await.unwrap();
    assert_eq!(hits[0].name, "São Gonçalo");
}

#[tokio::test]
async fn reseeding_twice_keeps_one_copy_and_both_indexes() {
    let store = Arc::new(MemoryStore::new());
    load_demo_cities(store.as_ref()).await.unwrap();
    load_demo_cities(store.as_ref()).await.unwrap();
    let svc = QueryService::new(store.clone());
    svc.ensure_indexes().await.unwrap();
    assert_eq!(svc.count().await.unwrap(), 30);
    assert_eq!(store.indexes().unwrap().len(), 2);
}

// -----------------------------------------------------------------------------
// Deadlines
// -----------------------------------------------------------------------------

struct StalledStore;

#[async_trait]
impl GeoStore for StalledStore {
    async fn insert_batch(&self, _: &[Location]) -> Result<()> {
        Ok(())
    }
    async fn query_by_name(&self, _: &str, _: Option<&str>) -> Result<Option<Location>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }
    async fn query_near(&self, _: f64, _: f64, _: f64) -> Result<Vec<Location>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
    async fn search_text(&self, _: &str, _: usize) -> Result<Vec<Location>> {
        Ok(Vec::new())
    }
    async fn ensure_geo_index(&self) -> Result<()> {
        Ok(())
    }
    async fn ensure_text_index(&self) -> Result<()> {
        Ok(())
    }
    async fn reset_collection(&self) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn stalled_queries_time_out() {
    let svc = QueryService::with_timeouts(
        Arc::new(StalledStore),
        Timeouts {
            query: Duration::from_millis(20),
            admin: Duration::from_millis(40),
        },
    );

    let err = svc.location_by_name("Recife", None).await.unwrap_err();
    assert!(matches!(err, GeoError::Timeout { operation: "query_by_name", .. }));

    let err = svc.nearby(-8.0, -34.9, 10.0).await.unwrap_err();
    assert!(matches!(err, GeoError::Timeout { operation: "query_near", .. }));

    let err = svc.reset().await.unwrap_err();
    match err {
        GeoError::Timeout { after, .. } => assert_eq!(after, Duration::from_millis(40)),
        other => panic!("unexpected error: {other}"),
    }
}
