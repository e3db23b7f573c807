// src/lib.rs

//! Card Crawler Library
//!
//! Scrapes credit card listings into a timestamped JSON store and
//! downloads the card and brand images referenced by that store.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
