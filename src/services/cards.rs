// src/services/cards.rs

//! Card listing crawler service.
//!
//! Fetches one listing page, extracts its cards, then pauses for a random
//! polite delay before reporting the page as done.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{CardRecord, Config, CrawlerConfig, SourceConfig};
use crate::services::extractor::CardExtractor;
use crate::services::fetcher::{PageFetcher, PageLoader, polite_delay};
use crate::services::scheduler::PageSource;

/// Service for crawling card listing pages.
pub struct CardCrawler<L = PageFetcher> {
    loader: L,
    extractor: CardExtractor,
    source: SourceConfig,
    crawler: CrawlerConfig,
}

impl CardCrawler {
    /// Create a crawler that fetches over HTTP with the given client.
    pub fn new(config: &Config, client: Client) -> Result<Self> {
        let fallback = config.source.fallback_encoding()?;
        Self::with_loader(config, PageFetcher::new(client, fallback))
    }
}

impl<L: PageLoader> CardCrawler<L> {
    /// Create a crawler on top of any page loader.
    pub fn with_loader(config: &Config, loader: L) -> Result<Self> {
        let extractor =
            CardExtractor::new(&config.selectors, &config.labels, &config.source.base_url)?;

        Ok(Self {
            loader,
            extractor,
            source: config.source.clone(),
            crawler: config.crawler.clone(),
        })
    }

    async fn try_fetch_cards(&self, page: u32) -> Result<Vec<CardRecord>> {
        let url = self.source.page_url(page)?;
        let html = self.loader.load(url.as_str()).await?;
        let cards = self.extractor.extract(&html);
        log::debug!("Page {}: extracted {} cards", page, cards.len());
        Ok(cards)
    }
}

#[async_trait]
impl<L: PageLoader> PageSource for CardCrawler<L> {
    async fn fetch_cards(&self, page: u32) -> Vec<CardRecord> {
        match self.try_fetch_cards(page).await {
            Ok(cards) => {
                let delay = polite_delay(self.crawler.delay_min_ms, self.crawler.delay_max_ms);
                tokio::time::sleep(delay).await;
                cards
            }
            Err(error) => {
                log::warn!("Error fetching page {}: {}", page, error);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::utils::http::create_async_client;

    #[test]
    fn test_new_with_default_config() {
        let config = Config::default();
        let client = create_async_client(&config.crawler).unwrap();
        assert!(CardCrawler::new(&config, client).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_encoding() {
        let mut config = Config::default();
        config.source.fallback_encoding = "nope".to_string();
        let client = create_async_client(&config.crawler).unwrap();
        assert!(CardCrawler::new(&config, client).is_err());
    }

    /// Serves fixed markup, or fails, and records requested URLs.
    struct StaticPages {
        html: Option<&'static str>,
        requested: std::sync::Mutex<Vec<String>>,
    }

    impl StaticPages {
        fn new(html: Option<&'static str>) -> Self {
            Self {
                html,
                requested: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageLoader for StaticPages {
        async fn load(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.html
                .map(str::to_string)
                .ok_or_else(|| AppError::fetch(url, "connection refused"))
        }
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.crawler.delay_min_ms = 0;
        config.crawler.delay_max_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_failed_page_yields_empty_list() {
        let crawler = CardCrawler::with_loader(&quiet_config(), StaticPages::new(None)).unwrap();
        assert!(crawler.fetch_cards(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_page_is_requested_and_extracted() {
        let html = r#"<ul><li class="p-planSearchList_item">
            <div class="card-spec-blk"><a class="p-planSearchList_name_link" href="/card/item/1/">Card A</a></div>
        </li></ul>"#;
        let crawler =
            CardCrawler::with_loader(&quiet_config(), StaticPages::new(Some(html))).unwrap();

        let cards = crawler.fetch_cards(47).await;

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Card A");
        assert_eq!(
            *crawler.loader.requested.lock().unwrap(),
            vec!["https://kakaku.com/card/list/?cc_page=47".to_string()]
        );
    }
}
