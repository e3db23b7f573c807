// src/models/selectors.rs

//! CSS selectors and label vocabulary for the card listing markup.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Parse one CSS selector, naming it in the error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// CSS selectors for scraping a card listing page.
///
/// Selectors other than `item` are evaluated inside a single listing item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardSelectors {
    /// Selector for each listing item on the page
    pub item: String,

    /// Selector for the primary card image
    pub card_image: String,

    /// Selector for each labelled spec row
    pub spec_row: String,

    /// Selector for a spec row's label
    pub spec_head: String,

    /// Selector for a spec row's value
    pub spec_detail: String,

    /// Selector for each brand entry inside the brand spec value
    pub brand_item: String,

    /// Selector for a brand entry's logo; only the first match is used
    pub brand_image: String,

    /// Selector for the card name link
    pub name_link: String,

    /// Selector for the rank number
    pub rank: String,

    pub introduction_title: String,

    pub introduction_text: String,

    /// Selector for each feature blurb
    pub feature: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            item: "li.p-planSearchList_item".to_string(),
            card_image: "div.main-card img".to_string(),
            spec_row: "li.p-itemBox_data_spec_list".to_string(),
            spec_head: "div.p-itemBox_data_spec_head".to_string(),
            spec_detail: "div.p-itemBox_data_spec_detail".to_string(),
            brand_item: "li.p-itemBox_data_brand_item".to_string(),
            brand_image: "img".to_string(),
            name_link: "div.card-spec-blk a.p-planSearchList_name_link".to_string(),
            rank: "span.rank-box span".to_string(),
            introduction_title: "p.p-itemBox_catch_ttl".to_string(),
            introduction_text: "p.p-itemBox_catch_txt".to_string(),
            feature: "li.p-itemBox_recm_item".to_string(),
        }
    }
}

impl CardSelectors {
    /// Every selector with its config key, in declaration order.
    pub fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("item", &self.item),
            ("card_image", &self.card_image),
            ("spec_row", &self.spec_row),
            ("spec_head", &self.spec_head),
            ("spec_detail", &self.spec_detail),
            ("brand_item", &self.brand_item),
            ("brand_image", &self.brand_image),
            ("name_link", &self.name_link),
            ("rank", &self.rank),
            ("introduction_title", &self.introduction_title),
            ("introduction_text", &self.introduction_text),
            ("feature", &self.feature),
        ]
    }

    /// Check that every selector parses.
    pub fn validate(&self) -> Result<()> {
        for (key, selector) in self.entries() {
            parse_selector(selector).inspect_err(|_| log::error!("selectors.{} is invalid", key))?;
        }
        Ok(())
    }
}

/// Spec row labels the extractor recognizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecLabels {
    pub brand: String,
    pub annual_fee: String,
    pub point_rate: String,
}

impl Default for SpecLabels {
    fn default() -> Self {
        Self {
            brand: "国際ブランド".to_string(),
            annual_fee: "年会費".to_string(),
            point_rate: "ポイント還元率".to_string(),
        }
    }
}

/// A spec row label resolved against the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecField {
    Brands,
    AnnualFee,
    PointRate,
}

impl SpecLabels {
    /// Match a label exactly against the known vocabulary.
    pub fn classify(&self, label: &str) -> Option<SpecField> {
        if label == self.brand {
            Some(SpecField::Brands)
        } else if label == self.annual_fee {
            Some(SpecField::AnnualFee)
        } else if label == self.point_rate {
            Some(SpecField::PointRate)
        } else {
            None
        }
    }
}
