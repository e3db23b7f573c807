//! Storage abstractions for card persistence.
//!
//! The store is a single pretty-printed JSON array of card records. Which
//! file a run writes to depends on how it was invoked:
//!
//! ```text
//! data/
//! ├── credit_cards_all.json          # full-range scrape
//! └── credit_cards_pages_47_48.json  # scrape of pages 47 and 48
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CardRecord;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for card store backends.
#[async_trait]
pub trait CardStorage: Send + Sync {
    /// Load every stored card.
    ///
    /// A missing or unreadable store is an empty store, never an error.
    async fn load_cards(&self) -> Vec<CardRecord>;

    /// Replace the store with `cards`.
    async fn save_cards(&self, cards: &[CardRecord]) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
