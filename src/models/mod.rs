// src/models/mod.rs

//! Domain models for the card crawler.
//!
//! This module contains the data structures shared by the scrape and image
//! download pipelines.

mod card;
mod config;
mod image;
mod selectors;

// Re-export all public types
pub use card::{Brand, CardRecord};
pub use config::{Config, CrawlerConfig, PathsConfig, SourceConfig};
pub use image::{ImageCategory, ImageRef};
pub use selectors::{CardSelectors, SpecField, SpecLabels, parse_selector};
