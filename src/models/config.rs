//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CardSelectors, SpecLabels};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing site endpoints
    #[serde(default)]
    pub source: SourceConfig,

    /// Output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Listing markup selectors
    #[serde(default)]
    pub selectors: CardSelectors,

    /// Spec row label vocabulary
    #[serde(default)]
    pub labels: SpecLabels,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.group_size == 0 {
            return Err(AppError::validation("crawler.group_size must be > 0"));
        }
        if self.crawler.delay_min_ms > self.crawler.delay_max_ms {
            return Err(AppError::validation(
                "crawler.delay_min_ms must not exceed crawler.delay_max_ms",
            ));
        }
        if self.source.total_pages == 0 {
            return Err(AppError::validation("source.total_pages must be > 0"));
        }
        self.source.fallback_encoding()?;
        self.source.page_url(1)?;
        Url::parse(&self.source.base_url)?;
        self.selectors.validate()?;
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Lower bound of the pause after each page fetch
    #[serde(default = "defaults::delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the pause after each page fetch
    #[serde(default = "defaults::delay_max")]
    pub delay_max_ms: u64,

    /// Pages fetched concurrently per group
    #[serde(default = "defaults::group_size")]
    pub group_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            delay_min_ms: defaults::delay_min(),
            delay_max_ms: defaults::delay_max(),
            group_size: defaults::group_size(),
        }
    }
}

/// Listing site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Origin that relative links are resolved against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing page URL without the page parameter
    #[serde(default = "defaults::list_url")]
    pub list_url: String,

    /// Query parameter carrying the page number
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Number of listing pages scraped in full-range mode
    #[serde(default = "defaults::total_pages")]
    pub total_pages: u32,

    /// Encoding label used when the declared encoding fails to decode
    #[serde(default = "defaults::fallback_encoding")]
    pub fallback_encoding: String,
}

impl SourceConfig {
    /// URL of a single listing page.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.list_url)?;
        url.query_pairs_mut()
            .append_pair(&self.page_param, &page.to_string());
        Ok(url)
    }

    /// Resolve the fallback encoding label.
    pub fn fallback_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.fallback_encoding.as_bytes()).ok_or_else(|| {
            AppError::config(format!(
                "Unknown source.fallback_encoding '{}'",
                self.fallback_encoding
            ))
        })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            list_url: defaults::list_url(),
            page_param: defaults::page_param(),
            total_pages: defaults::total_pages(),
            fallback_encoding: defaults::fallback_encoding(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the card stores
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Destination for card images
    #[serde(default = "defaults::card_image_dir")]
    pub card_image_dir: PathBuf,

    /// Destination for brand images
    #[serde(default = "defaults::brand_image_dir")]
    pub brand_image_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            card_image_dir: defaults::card_image_dir(),
            brand_image_dir: defaults::brand_image_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn delay_min() -> u64 {
        2000
    }
    pub fn delay_max() -> u64 {
        5000
    }
    pub fn group_size() -> usize {
        5
    }

    // Source defaults
    pub fn base_url() -> String {
        "https://kakaku.com".into()
    }
    pub fn list_url() -> String {
        "https://kakaku.com/card/list/".into()
    }
    pub fn page_param() -> String {
        "cc_page".into()
    }
    pub fn total_pages() -> u32 {
        114
    }
    pub fn fallback_encoding() -> String {
        "Shift_JIS".into()
    }

    // Path defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn card_image_dir() -> PathBuf {
        PathBuf::from("images/cards")
    }
    pub fn brand_image_dir() -> PathBuf {
        PathBuf::from("images/brands")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_group_size() {
        let mut config = Config::default();
        config.crawler.group_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_delay_window() {
        let mut config = Config::default();
        config.crawler.delay_min_ms = 6000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_encoding() {
        let mut config = Config::default();
        config.source.fallback_encoding = "klingon".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.selectors.rank = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = Config::load(tmp.path().join("absent.toml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[source]\ntotal_pages = 3\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().source.total_pages, 3);
    }

    #[test]
    fn page_url_appends_page_param() {
        let source = SourceConfig::default();
        assert_eq!(
            source.page_url(47).unwrap().as_str(),
            "https://kakaku.com/card/list/?cc_page=47"
        );
    }

    #[test]
    fn fallback_encoding_resolves_cp932_alias() {
        let mut source = SourceConfig::default();
        source.fallback_encoding = "windows-31j".to_string();
        assert_eq!(source.fallback_encoding().unwrap(), encoding_rs::SHIFT_JIS);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            group_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.group_size, 3);
        assert_eq!(config.crawler.delay_max_ms, 5000);
        assert_eq!(config.source.total_pages, 114);
    }
}
