// src/services/fetcher.rs

//! Listing page fetcher.
//!
//! Downloads a page and decodes it with the declared encoding, falling back to
//! a legacy encoding when the bytes do not decode cleanly.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use rand::Rng;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::Result;
use crate::utils::http::charset_from_content_type;

/// How far into the document to look for a `<meta charset>` declaration.
const META_SNIFF_LIMIT: usize = 1024;

/// Something that can fetch a page as decoded markup.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String>;
}

/// Fetches listing pages as decoded text.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    fallback: &'static Encoding,
}

impl PageFetcher {
    pub fn new(client: Client, fallback: &'static Encoding) -> Self {
        Self { client, fallback }
    }

    /// GET a page and return its markup.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type)
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        Ok(decode_body(&bytes, declared.as_deref(), self.fallback, url))
    }
}

#[async_trait]
impl PageLoader for PageFetcher {
    async fn load(&self, url: &str) -> Result<String> {
        self.fetch(url).await
    }
}

/// Decode a response body.
///
/// The encoding is taken from a byte order mark, then the declared charset,
/// then a `<meta>` declaration, then UTF-8. Decoding is strict; on malformed
/// input the whole body is decoded again with `fallback`, and bytes that
/// encoding cannot map are dropped.
pub fn decode_body(
    bytes: &[u8],
    declared: Option<&str>,
    fallback: &'static Encoding,
    url: &str,
) -> String {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (detect_encoding(bytes, declared), bytes),
    };

    if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
        return text.into_owned();
    }

    log::warn!(
        "Encoding error on {} as {}, retrying with {}...",
        url,
        encoding.name(),
        fallback.name()
    );
    let (text, _) = fallback.decode_without_bom_handling(body);
    text.replace(char::REPLACEMENT_CHARACTER, "")
}

fn detect_encoding(bytes: &[u8], declared: Option<&str>) -> &'static Encoding {
    declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8)
}

/// Look for `charset=` in the head of the document.
fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();

    Encoding::for_label(label.as_bytes())
}

/// Random pause within `[min_ms, max_ms]` applied after each page fetch.
pub fn polite_delay(min_ms: u64, max_ms: u64) -> Duration {
    let (low, high) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    Duration::from_millis(rand::rng().random_range(low..=high))
}
