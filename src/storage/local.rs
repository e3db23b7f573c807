//! Local filesystem storage implementation.
//!
//! Writes go to a temporary sibling file that is renamed over the store, so a
//! reader never sees a half-written array.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::CardRecord;
use crate::storage::CardStorage;

/// JSON file card store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and parse the store, keeping every element that carries a name.
    async fn read_cards(&self) -> Result<Option<Vec<CardRecord>>> {
        let Some(bytes) = self.read_bytes().await? else {
            return Ok(None);
        };

        let values: Vec<Value> = serde_json::from_slice(&bytes)?;
        let mut cards = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match CardRecord::from_stored(value) {
                Some(card) => cards.push(card),
                None => log::warn!(
                    "Skipping stored entry #{} in {}: no card name",
                    index,
                    self.path.display()
                ),
            }
        }
        Ok(Some(cards))
    }
}

#[async_trait]
impl CardStorage for LocalStorage {
    async fn load_cards(&self) -> Vec<CardRecord> {
        match self.read_cards().await {
            Ok(Some(cards)) => {
                log::info!(
                    "Found {} existing cards in {}",
                    cards.len(),
                    self.path.display()
                );
                cards
            }
            Ok(None) => {
                log::info!("No existing cards found in {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                log::warn!(
                    "Error loading existing cards from {}: {}. Starting from an empty store.",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn save_cards(&self, cards: &[CardRecord]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cards)?;
        self.write_bytes(&bytes).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
