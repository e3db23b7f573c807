//! Service layer for the card crawler.
//!
//! This module contains the business logic for:
//! - Page fetching and decoding (`PageFetcher`)
//! - Card extraction from listing markup (`CardExtractor`)
//! - Bounded group scheduling of page fetches (`PageGroupScheduler`)
//! - The HTTP listing crawler (`CardCrawler`)
//! - Image downloads (`ImageDownloader`)

mod cards;
pub mod extractor;
pub mod fetcher;
pub mod images;
pub mod scheduler;

pub use cards::CardCrawler;
pub use extractor::{CardBuilder, CardExtractor};
pub use fetcher::{PageFetcher, PageLoader};
pub use images::{DownloadReport, HttpImageSource, ImageDownloader, ImageSource, ImageTargets};
pub use scheduler::{PageGroupScheduler, PageSource, full_range};
