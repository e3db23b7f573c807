// src/services/extractor.rs

//! Card record extraction from listing page markup.
//!
//! Every field is pulled by its own small step that yields an `Option`, and
//! the steps are folded into a [`CardBuilder`]. A missing block only drops the
//! field it feeds; an item is dropped only when no card name can be found.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Brand, CardRecord, CardSelectors, SpecField, SpecLabels, parse_selector};
use crate::utils::{normalize_whitespace, resolve_url};

/// Compiled selectors for one listing layout.
#[derive(Debug)]
struct CompiledSelectors {
    item: Selector,
    card_image: Selector,
    spec_row: Selector,
    spec_head: Selector,
    spec_detail: Selector,
    brand_item: Selector,
    brand_image: Selector,
    name_link: Selector,
    rank: Selector,
    introduction_title: Selector,
    introduction_text: Selector,
    feature: Selector,
}

impl CompiledSelectors {
    fn compile(selectors: &CardSelectors) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&selectors.item)?,
            card_image: parse_selector(&selectors.card_image)?,
            spec_row: parse_selector(&selectors.spec_row)?,
            spec_head: parse_selector(&selectors.spec_head)?,
            spec_detail: parse_selector(&selectors.spec_detail)?,
            brand_item: parse_selector(&selectors.brand_item)?,
            brand_image: parse_selector(&selectors.brand_image)?,
            name_link: parse_selector(&selectors.name_link)?,
            rank: parse_selector(&selectors.rank)?,
            introduction_title: parse_selector(&selectors.introduction_title)?,
            introduction_text: parse_selector(&selectors.introduction_text)?,
            feature: parse_selector(&selectors.feature)?,
        })
    }
}

/// Accumulates optional fields for one listing item.
#[derive(Debug, Default)]
pub struct CardBuilder {
    record: CardRecord,
    has_name: bool,
}

impl CardBuilder {
    pub fn name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.record.name = name;
            self.has_name = true;
        }
        self
    }

    pub fn detail_url(mut self, url: Option<String>) -> Self {
        self.record.detail_url = url;
        self
    }

    pub fn image_url(mut self, url: Option<String>) -> Self {
        self.record.image_url = url;
        self
    }

    pub fn rank(mut self, rank: Option<String>) -> Self {
        self.record.rank = rank;
        self
    }

    pub fn annual_fee(mut self, fee: Option<String>) -> Self {
        if fee.is_some() {
            self.record.annual_fee = fee;
        }
        self
    }

    pub fn point_rate(mut self, rate: Option<String>) -> Self {
        if rate.is_some() {
            self.record.point_rate = rate;
        }
        self
    }

    pub fn brands(mut self, brands: Option<Vec<Brand>>) -> Self {
        if brands.is_some() {
            self.record.brands = brands;
        }
        self
    }

    pub fn introduction(mut self, title: Option<String>, text: Option<String>) -> Self {
        self.record.introduction_title = title;
        self.record.introduction_text = text;
        self
    }

    pub fn features(mut self, features: Vec<String>) -> Self {
        self.record.features = Some(features);
        self
    }

    /// Finish the record; `None` when no name was supplied.
    pub fn build(self) -> Option<CardRecord> {
        self.has_name.then_some(self.record)
    }
}

/// Extracts card records from listing page HTML.
#[derive(Debug)]
pub struct CardExtractor {
    selectors: CompiledSelectors,
    labels: SpecLabels,
    base_url: Url,
}

impl CardExtractor {
    /// Compile the selectors once. Fails on an invalid selector or base URL.
    pub fn new(selectors: &CardSelectors, labels: &SpecLabels, base_url: &str) -> Result<Self> {
        Ok(Self {
            selectors: CompiledSelectors::compile(selectors)?,
            labels: labels.clone(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Extract every named card on the page, in page order.
    pub fn extract(&self, html: &str) -> Vec<CardRecord> {
        let document = Html::parse_document(html);
        let mut cards = Vec::new();
        let mut unnamed = 0;

        for item in document.select(&self.selectors.item) {
            match self.extract_item(item) {
                Some(card) => cards.push(card),
                None => unnamed += 1,
            }
        }

        if unnamed > 0 {
            log::debug!("Dropped {} listing item(s) without a card name", unnamed);
        }
        cards
    }

    fn extract_item(&self, item: ElementRef<'_>) -> Option<CardRecord> {
        let (name, detail_url) = self.name_and_link(item);

        let builder = CardBuilder::default()
            .image_url(self.card_image(item))
            .name(name)
            .detail_url(detail_url)
            .rank(self.first_text(item, &self.selectors.rank))
            .introduction(
                self.first_text(item, &self.selectors.introduction_title),
                self.first_text(item, &self.selectors.introduction_text),
            )
            .features(self.features(item));

        self.apply_spec_rows(item, builder).build()
    }

    fn card_image(&self, item: ElementRef<'_>) -> Option<String> {
        let img = item.select(&self.selectors.card_image).next()?;
        self.absolute_attr(img, "src")
    }

    fn name_and_link(&self, item: ElementRef<'_>) -> (Option<String>, Option<String>) {
        match item.select(&self.selectors.name_link).next() {
            Some(link) => (text_of(link), self.absolute_attr(link, "href")),
            None => (None, None),
        }
    }

    fn features(&self, item: ElementRef<'_>) -> Vec<String> {
        item.select(&self.selectors.feature)
            .filter_map(text_of)
            .collect()
    }

    fn apply_spec_rows(&self, item: ElementRef<'_>, mut builder: CardBuilder) -> CardBuilder {
        for row in item.select(&self.selectors.spec_row) {
            let Some(label) = self.first_text(row, &self.selectors.spec_head) else {
                continue;
            };
            let Some(detail) = row.select(&self.selectors.spec_detail).next() else {
                continue;
            };

            builder = match self.labels.classify(&label) {
                Some(SpecField::Brands) => builder.brands(Some(self.brands(detail))),
                Some(SpecField::AnnualFee) => builder.annual_fee(text_of(detail)),
                Some(SpecField::PointRate) => builder.point_rate(text_of(detail)),
                None => {
                    log::debug!("Ignoring spec row with unknown label '{}'", label);
                    builder
                }
            };
        }
        builder
    }

    fn brands(&self, detail: ElementRef<'_>) -> Vec<Brand> {
        detail
            .select(&self.selectors.brand_item)
            .filter_map(|entry| {
                let img = entry.select(&self.selectors.brand_image).next()?;
                let image_url = self.absolute_attr(img, "src")?;
                let name = img.value().attr("alt").unwrap_or_default().trim().to_string();
                Some(Brand { name, image_url })
            })
            .collect()
    }

    fn first_text(&self, scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
        scope.select(selector).next().and_then(text_of)
    }

    fn absolute_attr(&self, element: ElementRef<'_>, attr: &str) -> Option<String> {
        let raw = element.value().attr(attr)?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(resolve_url(&self.base_url, raw))
    }
}

/// Normalized text content, `None` when blank.
fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = normalize_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}
