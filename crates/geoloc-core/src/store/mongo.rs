// crates/geoloc-core/src/store/mongo.rs
use super::GeoStore;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::Location;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{Error as MongoError, ErrorKind},
    options::{ClientOptions, FindOneOptions, FindOptions},
    Client, Collection, IndexModel,
};
use std::time::Duration;
use tracing::{debug, info};

/// Server error codes that mean "this index is already there".
/// 85 IndexOptionsConflict, 86 IndexKeySpecsConflict, 68 IndexAlreadyExists.
const INDEX_EXISTS_CODES: [i32; 3] = [85, 86, 68];
/// NamespaceNotFound: dropping a collection that does not exist.
const NAMESPACE_NOT_FOUND: i32 = 26;

/// [`GeoStore`] backed by a MongoDB collection.
///
/// Documents use the `municipio` / `estado` / `localizacao` (GeoJSON) /
/// `populacao` layout. Radius queries rely on a `2dsphere` index on
/// `localizacao`, text search on a text index over `municipio` and `estado`.
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<Location>,
}

impl MongoStore {
    /// Connects and pings the server.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut opts = ClientOptions::parse(&config.uri).await?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        opts.connect_timeout = Some(timeout);
        opts.server_selection_timeout = Some(timeout);
        opts.app_name = Some("geoloc".to_owned());
        let client = Client::with_options(opts)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        info!(database = %config.database, collection = %config.collection, "connected to MongoDB");

        let collection = client
            .database(&config.database)
            .collection::<Location>(&config.collection);
        Ok(Self { collection })
    }

    async fn create_index(&self, keys: Document, label: &'static str) -> Result<()> {
        let model = IndexModel::builder().keys(keys).build();
        match self.collection.create_index(model, None).await {
            Ok(res) => {
                debug!(index = %res.index_name, "{label} index ready");
                Ok(())
            }
            Err(e) if has_code(&e, &INDEX_EXISTS_CODES) => {
                debug!(code = ?command_code(&e), "{label} index already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn command_code(e: &MongoError) -> Option<i32> {
    match e.kind.as_ref() {
        ErrorKind::Command(cmd) => Some(cmd.code),
        _ => None,
    }
}

fn has_code(e: &MongoError, codes: &[i32]) -> bool {
    command_code(e).is_some_and(|c| codes.contains(&c))
}

#[async_trait]
impl GeoStore for MongoStore {
    async fn insert_batch(&self, locations: &[Location]) -> Result<()> {
        if locations.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(locations, None).await?;
        Ok(())
    }

    async fn query_by_name(&self, name: &str, region: Option<&str>) -> Result<Option<Location>> {
        let mut filter = doc! { "municipio": name };
        if let Some(region) = region {
            filter.insert("estado", region);
        }
        let options = FindOneOptions::builder()
            .sort(doc! { "populacao": -1 })
            .build();
        Ok(self.collection.find_one(filter, options).await?)
    }

    async fn query_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<Location>> {
        // $near sorts by distance; $maxDistance is in metres for GeoJSON points.
        let filter = doc! {
            "localizacao": {
                "$near": {
                    "$geometry": { "type": "Point", "coordinates": [longitude, latitude] },
                    "$maxDistance": max_distance_km * 1000.0,
                }
            }
        };
        let cursor = self.collection.find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Location>> {
        let score = doc! { "score": { "$meta": "textScore" } };
        let options = FindOptions::builder()
            .projection(score.clone())
            .sort(score)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();
        let cursor = self
            .collection
            .find(doc! { "$text": { "$search": query } }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn ensure_geo_index(&self) -> Result<()> {
        self.create_index(doc! { "localizacao": "2dsphere" }, "geo").await
    }

    async fn ensure_text_index(&self) -> Result<()> {
        self.create_index(doc! { "municipio": "text", "estado": "text" }, "text")
            .await
    }

    async fn reset_collection(&self) -> Result<()> {
        match self.collection.drop(None).await {
            Ok(()) => {}
            Err(e) if has_code(&e, &[NAMESPACE_NOT_FOUND]) => {}
            Err(e) => return Err(e.into()),
        }
        info!(collection = %self.collection.name(), "collection dropped");
        self.ensure_geo_index().await?;
        self.ensure_text_index().await
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(None, None).await?)
    }
}
