// src/services/images.rs

//! Image download service.
//!
//! Collects card and brand image URLs from stored records and downloads the
//! ones whose file name is not already on disk. Files are keyed by URL
//! basename only: two different URLs ending in the same file name are treated
//! as one image, and only the first is ever fetched.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{CardRecord, ImageCategory, ImageRef, PathsConfig};

/// Extensions counted as already-downloaded images.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Something that can fetch image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches images over HTTP with the run's shared client.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::fetch(url, format!("status {}", status)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Unique image URLs referenced by a set of cards, per category.
#[derive(Debug, Default)]
pub struct ImageUrls {
    pub cards: BTreeSet<String>,
    pub brands: BTreeSet<String>,
}

impl ImageUrls {
    pub fn for_category(&self, category: ImageCategory) -> &BTreeSet<String> {
        match category {
            ImageCategory::Card => &self.cards,
            ImageCategory::Brand => &self.brands,
        }
    }
}

/// Gather card and brand image URLs, deduplicated by URL.
pub fn collect_image_urls(cards: &[CardRecord]) -> ImageUrls {
    let mut urls = ImageUrls::default();
    for card in cards {
        if let Some(url) = &card.image_url {
            urls.cards.insert(url.clone());
        }
        urls.brands.extend(card.brand_image_urls().map(str::to_string));
    }
    urls
}

/// File names of images already present in `dir`.
///
/// A missing directory counts as empty.
pub async fn scan_existing(dir: &Path) -> Result<HashSet<String>> {
    let mut existing = HashSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(existing),
        Err(e) => return Err(AppError::Io(e)),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            existing.insert(name.to_string());
        }
    }
    Ok(existing)
}

/// What needs downloading for one category.
#[derive(Debug, Default)]
pub struct DownloadPlan {
    pub pending: Vec<ImageRef>,
    pub already_present: usize,
    pub skipped: usize,
}

/// Decide which URLs to download, given the files already on disk.
///
/// URLs without a basename are skipped. When several pending URLs share a
/// basename, only the first in URL order is kept.
pub fn plan_downloads(
    urls: &BTreeSet<String>,
    category: ImageCategory,
    existing: &HashSet<String>,
) -> DownloadPlan {
    let mut plan = DownloadPlan::default();
    let mut claimed: HashSet<String> = HashSet::new();

    for url in urls {
        let Some(image) = ImageRef::new(url.as_str(), category) else {
            log::warn!("Skipping {} image with no file name: {}", category, url);
            plan.skipped += 1;
            continue;
        };

        if existing.contains(&image.filename) {
            plan.already_present += 1;
        } else if !claimed.insert(image.filename.clone()) {
            log::warn!(
                "Skipping {}: file name {} already claimed by another {} image",
                url,
                image.filename,
                category
            );
            plan.skipped += 1;
        } else {
            plan.pending.push(image);
        }
    }
    plan
}

/// Outcome of one category's downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub category: ImageCategory,
    pub found: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Where each category of image is stored.
#[derive(Debug, Clone)]
pub struct ImageTargets {
    pub card_dir: PathBuf,
    pub brand_dir: PathBuf,
}

impl ImageTargets {
    pub fn dir(&self, category: ImageCategory) -> &Path {
        match category {
            ImageCategory::Card => &self.card_dir,
            ImageCategory::Brand => &self.brand_dir,
        }
    }
}

impl From<&PathsConfig> for ImageTargets {
    fn from(paths: &PathsConfig) -> Self {
        Self {
            card_dir: paths.card_image_dir.clone(),
            brand_dir: paths.brand_image_dir.clone(),
        }
    }
}

/// Downloads missing images for a set of cards.
pub struct ImageDownloader<S> {
    source: S,
    targets: ImageTargets,
}

impl<S: ImageSource> ImageDownloader<S> {
    pub fn new(source: S, targets: ImageTargets) -> Self {
        Self { source, targets }
    }

    /// Download every missing brand image, then every missing card image.
    pub async fn run(&self, cards: &[CardRecord]) -> Result<Vec<DownloadReport>> {
        let categories = [ImageCategory::Brand, ImageCategory::Card];

        let mut existing = Vec::with_capacity(categories.len());
        for category in categories {
            let dir = self.targets.dir(category);
            tokio::fs::create_dir_all(dir).await?;
            let files = scan_existing(dir).await?;
            log::info!("Found {} existing {} images", files.len(), category);
            existing.push(files);
        }

        let urls = collect_image_urls(cards);
        let plans: Vec<_> = categories
            .iter()
            .zip(&existing)
            .map(|(&category, files)| {
                let found = urls.for_category(category);
                log::info!("Found {} unique {} image URLs", found.len(), category);
                (category, found.len(), plan_downloads(found, category, files))
            })
            .collect();

        for (category, _, plan) in &plans {
            log::info!(
                "Need to download {} new {} images",
                plan.pending.len(),
                category
            );
        }
        if plans.iter().all(|(_, _, plan)| plan.pending.is_empty()) {
            log::info!("No new images to download");
        }

        let mut reports = Vec::with_capacity(plans.len());
        for (category, found, plan) in plans {
            let (succeeded, failed) = self.download_all(&plan.pending, category).await;
            reports.push(DownloadReport {
                category,
                found,
                already_present: plan.already_present,
                skipped: plan.skipped,
                succeeded,
                failed,
            });
        }
        Ok(reports)
    }

    /// Download all pending images of one category concurrently.
    async fn download_all(&self, pending: &[ImageRef], category: ImageCategory) -> (usize, usize) {
        if pending.is_empty() {
            return (0, 0);
        }

        log::info!("Downloading {} images...", category);
        let dir = self.targets.dir(category);
        let downloads = pending.iter().map(|image| self.download_one(image, dir));
        let results = future::join_all(downloads).await;

        let succeeded = results.iter().filter(|ok| **ok).count();
        let failed = results.len() - succeeded;
        log::info!(
            "{} images completed: {} successful, {} failed",
            category,
            succeeded,
            failed
        );
        (succeeded, failed)
    }

    async fn download_one(&self, image: &ImageRef, dir: &Path) -> bool {
        let bytes = match self.source.fetch_image(&image.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to download {}: {}", image.url, e);
                return false;
            }
        };

        match tokio::fs::write(dir.join(&image.filename), bytes).await {
            Ok(()) => {
                log::info!("Downloaded: {}", image.url);
                true
            }
            Err(e) => {
                log::warn!("Failed to save {}: {}", image.url, e);
                false
            }
        }
    }
}
