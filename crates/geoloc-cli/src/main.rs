//! geoloc: import and serve Brazilian municipalities
//!
//! Actions (combinable, executed in this order):
//!
//! - `--import-all`: reset the collection, download the GeoNames `BR.zip`
//!   dump, unpack it and import `BR.txt` in full mode.
//! - `--import` / `--file <PATH>`: import the fixed demo city list, or a
//!   local GeoNames file (`--simple` for pre-cleaned sources).
//! - `--serve`: expose the HTTP API on `0.0.0.0:<port>` until Ctrl-C.
//!
//! Indexes are ensured after every import and before serving.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use geoloc_cli::args::CliArgs;
use geoloc_cli::{build_config, init_logging};
use geoloc_core::{open_store, seed, AppConfig, ImportMode, Importer, QueryService};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    if !args.has_action() {
        // Nothing to do: show usage and exit cleanly.
        if let Err(e) = CliArgs::command().print_help() {
            error!(error = %e, "could not print usage");
            std::process::exit(1);
        }
        println!();
        return;
    }

    if let Err(e) = run(args).await {
        error!(error = %format!("{e:#}"), "geoloc failed");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    info!(
        backend = ?config.store.backend,
        database = %config.store.database,
        collection = %config.store.collection,
        "opening store"
    );
    let store = open_store(&config.store)
        .await
        .context("could not connect to the store")?;
    let service = QueryService::with_timeouts(store, config.timeouts());

    if args.import_all {
        import_all(&config, &service).await?;
    }

    if args.wants_import() {
        match &args.file {
            Some(path) => {
                let mode = if args.simple {
                    ImportMode::Simple
                } else {
                    ImportMode::Full
                };
                import_file(&config, &service, path, mode).await?;
            }
            None => {
                let count = seed::load_demo_cities(service.store().as_ref())
                    .await
                    .context("loading demo cities")?;
                info!(count, "demo cities imported");
            }
        }
        service.ensure_indexes().await.context("creating indexes")?;
        log_stored(&service).await;
    }

    if args.serve {
        service.ensure_indexes().await.context("creating indexes")?;
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        geoloc_api::serve(service, addr, shutdown_signal())
            .await
            .with_context(|| format!("HTTP server on {addr}"))?;
        info!("server stopped");
    }

    Ok(())
}

async fn import_file(
    config: &AppConfig,
    service: &QueryService,
    path: &Path,
    mode: ImportMode,
) -> anyhow::Result<()> {
    let importer = Importer::new(config.import.clone(), mode)
        .with_insert_timeout(config.timeouts().admin);
    let report = importer
        .import_path(path, service.store().as_ref())
        .await
        .with_context(|| format!("importing {}", path.display()))?;

    if report.accepted == 0 && report.processed > 0 {
        warn!(processed = report.processed, "no rows were accepted");
    }
    Ok(())
}

#[cfg(feature = "fetch")]
async fn import_all(config: &AppConfig, service: &QueryService) -> anyhow::Result<()> {
    service.reset().await.context("resetting collection")?;
    let dataset = geoloc_core::loader::fetch::fetch_country_dataset(&config.import)
        .await
        .context("downloading GeoNames dump")?;
    import_file(config, service, &dataset, ImportMode::Full).await?;
    service.ensure_indexes().await.context("creating indexes")?;
    log_stored(service).await;
    Ok(())
}

#[cfg(not(feature = "fetch"))]
async fn import_all(_: &AppConfig, _: &QueryService) -> anyhow::Result<()> {
    anyhow::bail!("--import-all needs the 'fetch' feature")
}

/// Total after an import; a failing count only costs the log line.
async fn log_stored(service: &QueryService) {
    match service.count().await {
        Ok(stored) => info!(stored, "locations in store"),
        Err(e) => warn!(error = %e, "could not count stored locations"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
    info!("shutdown requested");
}
