// demos/seed_and_query.rs
//
// Seeds an in-memory store with the demo cities and runs a few queries.
//
//     cargo run --example seed_and_query

use geoloc_core::seed::load_demo_cities;
use geoloc_core::{normalize_municipio, GeoError, LocationView, MemoryStore, QueryService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), GeoError> {
    let store = Arc::new(MemoryStore::new());
    let loaded = load_demo_cities(store.as_ref()).await?;
    println!("Loaded {loaded} cities");

    let service = QueryService::new(store);

    let name = normalize_municipio("BELO HORIZONTE");
    match service.location_by_name(&name, Some("MG")).await? {
        Some(loc) => println!("{name}: {:?}", LocationView::from(&loc)),
        None => println!("{name}: not found"),
    }

    println!("\nWithin 100 km of Rio de Janeiro:");
    for loc in service.nearby(-22.9068, -43.1729, 100.0).await? {
        println!("  {} ({})", loc.name, loc.region);
    }

    println!("\nText search 'sao':");
    for loc in service.search("sao", 5).await? {
        println!("  {} ({})", loc.name, loc.region);
    }

    Ok(())
}
