// src/services/scheduler.rs

//! Page group scheduler.
//!
//! Pages are fetched in consecutive groups. Every page in a group runs
//! concurrently and the next group starts only after the whole group is done,
//! which caps open connections at the group size.

use async_trait::async_trait;
use futures::future;

use crate::models::CardRecord;

/// Something that can turn a page number into card records.
///
/// Implementations swallow their own failures: a page that cannot be fetched
/// or parsed yields an empty list.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_cards(&self, page: u32) -> Vec<CardRecord>;
}

/// Runs a page source over a list of pages in bounded groups.
#[derive(Debug, Clone, Copy)]
pub struct PageGroupScheduler {
    group_size: usize,
}

impl PageGroupScheduler {
    pub fn new(group_size: usize) -> Self {
        Self {
            group_size: group_size.max(1),
        }
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Split pages into consecutive groups of at most `group_size`.
    pub fn groups<'a>(&self, pages: &'a [u32]) -> impl Iterator<Item = &'a [u32]> {
        pages.chunks(self.group_size)
    }

    /// Fetch every page, group by group, and concatenate the records in page
    /// order.
    pub async fn run<S>(&self, source: &S, pages: &[u32]) -> Vec<CardRecord>
    where
        S: PageSource + ?Sized,
    {
        let mut cards = Vec::new();

        for group in self.groups(pages) {
            log::info!("Processing pages {:?}...", group);

            let fetches = group.iter().map(|&page| {
                log::debug!("Adding page {} to queue...", page);
                source.fetch_cards(page)
            });
            let results = future::join_all(fetches).await;

            for (page, page_cards) in group.iter().zip(results) {
                if page_cards.is_empty() {
                    log::debug!("Page {} yielded no cards", page);
                }
                cards.extend(page_cards);
            }

            log::info!(
                "Completed pages {:?}. Cards collected so far: {}",
                group,
                cards.len()
            );
        }

        cards
    }
}

/// Every page number of a full-range scrape, starting at 1.
pub fn full_range(total_pages: u32) -> Vec<u32> {
    (1..=total_pages).collect()
}
