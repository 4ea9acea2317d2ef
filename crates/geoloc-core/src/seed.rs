// crates/geoloc-core/src/seed.rs

//! Fixed list of large Brazilian cities used for demos and tests.

use crate::error::Result;
use crate::model::{GeoPoint, Location};
use crate::store::GeoStore;
use crate::text::normalize_municipio;
use tracing::info;

/// `(municipio, estado, lon, lat)`
const DEMO_CITIES: [(&str, &str, f64, f64); 30] = [
    ("São Paulo", "SP", -46.6333, -23.5505),
    ("Rio de Janeiro", "RJ", -43.1729, -22.9068),
    ("Brasília", "DF", -47.9292, -15.7801),
    ("Salvador", "BA", -38.5108, -12.9714),
    ("Fortaleza", "CE", -38.5434, -3.7172),
    ("Belo Horizonte", "MG", -43.9378, -19.9208),
    ("Manaus", "AM", -60.0217, -3.1190),
    ("Curitiba", "PR", -49.2643, -25.4284),
    ("Recife", "PE", -34.8813, -8.0476),
    ("Goiânia", "GO", -49.2532, -16.6864),
    ("Porto Alegre", "RS", -51.2302, -30.0346),
    ("Belém", "PA", -48.5044, -1.4558),
    ("Guarulhos", "SP", -46.5333, -23.4625),
    ("Campinas", "SP", -47.0608, -22.9099),
    ("São Luís", "MA", -44.3028, -2.5387),
    ("São Gonçalo", "RJ", -43.0539, -22.8268),
    ("Maceió", "AL", -35.7353, -9.6658),
    ("Duque de Caxias", "RJ", -43.3055, -22.7858),
    ("Natal", "RN", -35.2094, -5.7945),
    ("Teresina", "PI", -42.8034, -5.0892),
    ("Campo Grande", "MS", -54.6295, -20.4697),
    ("João Pessoa", "PB", -34.8631, -7.1195),
    ("Jaboatão dos Guararapes", "PE", -35.0147, -8.1130),
    ("Osasco", "SP", -46.7917, -23.5329),
    ("Santo André", "SP", -46.5386, -23.6639),
    ("São Bernardo do Campo", "SP", -46.5650, -23.6914),
    ("Ribeirão Preto", "SP", -47.8103, -21.1704),
    ("Uberlândia", "MG", -48.2772, -18.9186),
    ("Contagem", "MG", -44.0539, -19.9320),
    ("Aracaju", "SE", -37.0731, -10.9091),
];

/// The demo cities with normalized names, in their fixed order.
pub fn demo_cities() -> Result<Vec<Location>> {
    DEMO_CITIES
        .iter()
        .map(|&(name, region, lon, lat)| {
            Ok(Location::new(
                normalize_municipio(name),
                region,
                GeoPoint::new(lon, lat)?,
            ))
        })
        .collect()
}

/// Replaces the store contents with the demo cities.
///
/// The collection is reset first (which also recreates both indexes), so
/// running this twice leaves exactly one copy of each city.
pub async fn load_demo_cities(store: &dyn GeoStore) -> Result<usize> {
    let cities = demo_cities()?;
    store.reset_collection().await?;
    store.insert_batch(&cities).await?;
    info!(count = cities.len(), "demo cities loaded");
    Ok(cities.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn demo_cities_are_normalized_and_in_bounds() {
        let cities = demo_cities().unwrap();
        assert_eq!(cities.len(), 30);
        let bbox = crate::model::BoundingBox::BRAZIL;
        assert!(cities.iter().all(|c| bbox.contains(c.point.lat(), c.point.lon())));
        assert!(cities.iter().all(|c| crate::regions::is_known_region(&c.region)));
        assert!(cities.iter().any(|c| c.name == "Jaboatão Dos Guararapes"));
        assert!(cities.iter().any(|c| c.name == "São Bernardo do Campo"));
    }

    #[tokio::test]
    async fn reloading_replaces_contents() {
        let store = MemoryStore::new();
        load_demo_cities(&store).await.unwrap();
        load_demo_cities(&store).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 30);
    }
}
