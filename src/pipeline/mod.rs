//! Pipeline entry points for crawler operations.
//!
//! - `run_scraper`: Fetch listing pages, merge, and persist card records
//! - `run_image_download`: Download card and brand images from the store

pub mod images;
pub mod merge;
pub mod scrape;

pub use images::run_image_download;
pub use merge::{CardTable, MergeSummary, merge_cards};
pub use scrape::{ScrapeMode, ScrapeSummary, run_scraper, scrape_into_store};
