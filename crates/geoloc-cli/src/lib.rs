//! geoloc-cli
//! ==========
//!
//! Command-line front end for `geoloc-core`: imports GeoNames data into the
//! configured store and serves the HTTP API from `geoloc-api`.
//!
//! Quick start
//! -----------
//!
//! ```text
//! geoloc --import --serve                    # demo cities, then serve on :8080
//! geoloc --file BR.txt                       # import a local GeoNames dump
//! geoloc --import-all --serve --port 9000    # download BR.zip, import, serve
//! geoloc --store memory --snapshot geo.bin.gz --import --serve
//! ```
//!
//! Settings come from defaults, then `--config <file.toml>`, then flags or
//! `GEOLOC_*` environment variables.

pub mod args;

use crate::args::CliArgs;
use anyhow::Context;
use geoloc_core::AppConfig;
use tracing_subscriber::EnvFilter;

/// Builds the effective configuration: defaults, then the TOML file, then
/// flags and environment variables.
pub fn build_config(args: &CliArgs) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(backend) = args.backend {
        config.store.backend = backend;
    }
    if let Some(uri) = &args.mongo_uri {
        config.store.uri = uri.clone();
    }
    if let Some(database) = &args.database {
        config.store.database = database.clone();
    }
    if let Some(collection) = &args.collection {
        config.store.collection = collection.clone();
    }
    if let Some(snapshot) = &args.snapshot {
        config.store.snapshot = Some(snapshot.clone());
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the
/// default `info` level.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
