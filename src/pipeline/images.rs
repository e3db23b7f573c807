// src/pipeline/images.rs

//! Image download pipeline.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::services::{DownloadReport, HttpImageSource, ImageDownloader, ImageTargets};
use crate::storage::{CardStorage, LocalStorage};
use crate::utils::http;

/// Download every image referenced by the store at `store_path` that is not
/// already on disk.
pub async fn run_image_download(config: &Config, store_path: &Path) -> Result<Vec<DownloadReport>> {
    let storage = LocalStorage::new(store_path);
    let cards = storage.load_cards().await;

    let client = http::create_async_client(&config.crawler)?;
    let downloader = ImageDownloader::new(
        HttpImageSource::new(client),
        ImageTargets::from(&config.paths),
    );

    let reports = downloader.run(&cards).await?;
    for report in &reports {
        log::info!(
            "{} images: {} referenced, {} already present, {} skipped, {} downloaded, {} failed",
            report.category,
            report.found,
            report.already_present,
            report.skipped,
            report.succeeded,
            report.failed
        );
    }
    Ok(reports)
}
