// crates/geoloc-core/src/loader/fetch.rs

//! Download and unpack of the GeoNames per-country dump (`BR.zip` → `BR.txt`).

use crate::config::ImportConfig;
use crate::error::{GeoError, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Downloads `url` into `dest`, replacing any existing file.
pub async fn download(url: &str, dest: &Path) -> Result<PathBuf> {
    info!(url, dest = %dest.display(), "downloading dataset");
    let response = reqwest::get(url).await?.error_for_status()?;
    let body = response.bytes().await?;
    tokio::fs::write(dest, &body).await?;
    info!(bytes = body.len(), "download complete");
    Ok(dest.to_path_buf())
}

/// Unpacks every file of a zip archive below `dest_dir`.
///
/// Entries whose names would escape `dest_dir` (absolute paths, `..`) are
/// skipped. Returns the paths written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| {
        GeoError::NotFound(format!("archive {}: {}", archive_path.display(), e))
    })?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            debug!(name = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!(path = %out_path.display(), "extracted");
        written.push(out_path);
    }

    Ok(written)
}

/// Downloads `config.dataset_url` into `config.download_dir`, unpacks it and
/// returns the path of `<COUNTRY>.txt`.
pub async fn fetch_country_dataset(config: &ImportConfig) -> Result<PathBuf> {
    let dir = &config.download_dir;
    let country = &config.country_code;
    tokio::fs::create_dir_all(dir).await?;
    let archive = download(&config.dataset_url, &dir.join(format!("{country}.zip"))).await?;

    let target = dir.clone();
    let archive_for_task = archive.clone();
    let extracted = tokio::task::spawn_blocking(move || extract_zip(&archive_for_task, &target))
        .await??;
    info!(files = extracted.len(), archive = %archive.display(), "archive extracted");

    let wanted = format!("{country}.txt");
    extracted
        .into_iter()
        .find(|p| p.file_name().is_some_and(|n| n == wanted.as_str()))
        .ok_or_else(|| GeoError::NotFound(format!("{wanted} not present in {}", archive.display())))
}
