// src/pipeline/scrape.rs

//! Card scraping pipeline: fetch pages in groups, merge, persist.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::merge::{MergeSummary, merge_cards, merge_timestamp};
use crate::services::{CardCrawler, PageGroupScheduler, PageSource, full_range};
use crate::storage::{CardStorage, LocalStorage};
use crate::utils::http;

/// Which pages a scrape covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Explicit page numbers from the command line
    Pages(Vec<u32>),
    /// Pages 1 through the configured total
    FullRange,
}

impl ScrapeMode {
    /// Parse the optional comma-separated page argument.
    pub fn from_arg(arg: Option<&str>) -> Result<Self> {
        let Some(raw) = arg else {
            return Ok(Self::FullRange);
        };

        let pages = raw
            .split(',')
            .map(|part| part.trim().parse::<u32>().ok().filter(|&page| page > 0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AppError::InvalidPages(raw.to_string()))?;

        Ok(Self::Pages(pages))
    }

    /// Page numbers to fetch.
    pub fn pages(&self, total_pages: u32) -> Vec<u32> {
        match self {
            Self::Pages(pages) => pages.clone(),
            Self::FullRange => full_range(total_pages),
        }
    }

    /// Store file name; partial runs get their own file.
    pub fn store_file_name(&self) -> String {
        match self {
            Self::Pages(pages) => {
                let joined: Vec<String> = pages.iter().map(u32::to_string).collect();
                format!("credit_cards_pages_{}.json", joined.join("_"))
            }
            Self::FullRange => "credit_cards_all.json".to_string(),
        }
    }

    /// Store path under the data directory.
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.store_file_name())
    }
}

/// Summary of a scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub scraped: usize,
    pub existing: usize,
    pub total: usize,
    pub merge: MergeSummary,
    pub location: String,
}

/// Scrape `pages` through `source` and merge the result into `storage`.
pub async fn scrape_into_store<S>(
    source: &S,
    scheduler: &PageGroupScheduler,
    storage: &dyn CardStorage,
    pages: &[u32],
) -> Result<ScrapeSummary>
where
    S: PageSource + ?Sized,
{
    let scraped = scheduler.run(source, pages).await;
    let scraped_count = scraped.len();

    let existing = storage.load_cards().await;
    let existing_count = existing.len();

    let (merged, merge) = merge_cards(existing, scraped, merge_timestamp());
    log::info!(
        "After merging: {} total cards ({} new, {} updated)",
        merged.len(),
        merge.inserted,
        merge.updated
    );

    storage.save_cards(&merged).await?;

    Ok(ScrapeSummary {
        scraped: scraped_count,
        existing: existing_count,
        total: merged.len(),
        merge,
        location: storage.location(),
    })
}

/// Run the card scraper against the live site.
pub async fn run_scraper(config: &Config, mode: &ScrapeMode) -> Result<ScrapeSummary> {
    let pages = mode.pages(config.source.total_pages);
    match mode {
        ScrapeMode::Pages(_) => log::info!("Will scrape specific pages: {:?}", pages),
        ScrapeMode::FullRange => log::info!("Will scrape all {} pages", pages.len()),
    }

    let client = http::create_async_client(&config.crawler)?;
    let crawler = CardCrawler::new(config, client)?;
    let scheduler = PageGroupScheduler::new(config.crawler.group_size);
    let storage = LocalStorage::new(mode.store_path(&config.paths.data_dir));

    let summary = scrape_into_store(&crawler, &scheduler, &storage, &pages).await?;

    log::info!("Total cards saved: {}", summary.total);
    log::info!("Data saved to: {}", summary.location);
    Ok(summary)
}
