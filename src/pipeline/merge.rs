//! Merge engine for incremental card updates.
//!
//! The store is worked on as a name-keyed table and only turned back into an
//! array when it is written out. Existing cards keep their position; new
//! cards are appended in scrape order.

use std::collections::HashMap;

use chrono::{Local, NaiveDateTime, SubsecRound};

use crate::models::CardRecord;

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Cards indexed by name, in first-seen order.
#[derive(Debug, Default)]
pub struct CardTable {
    records: Vec<CardRecord>,
    index: HashMap<String, usize>,
}

impl CardTable {
    /// Build a table from stored cards.
    ///
    /// A name that appears twice in the store is folded into its first entry.
    pub fn from_records(records: Vec<CardRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            if !has_key(&record) {
                continue;
            }
            match table.index.get(&record.name) {
                Some(&slot) => table.records[slot].merge_from(record),
                None => table.push(record),
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CardRecord> {
        self.index.get(name).map(|&slot| &self.records[slot])
    }

    /// Merge freshly scraped cards, stamping them with `now`.
    ///
    /// Known names are shallow-updated and get `updated_at = now`; their
    /// `created_at` is kept. Unknown names are inserted with both timestamps
    /// set to `now`. Cards with a blank name are ignored.
    pub fn merge(&mut self, scraped: Vec<CardRecord>, now: NaiveDateTime) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for mut card in scraped {
            if !has_key(&card) {
                summary.skipped += 1;
                continue;
            }

            match self.index.get(&card.name) {
                Some(&slot) => {
                    let existing = &mut self.records[slot];
                    existing.merge_from(card);
                    existing.stamp_created(now);
                    existing.stamp_updated(now);
                    summary.updated += 1;
                }
                None => {
                    card.created_at = Some(now);
                    card.updated_at = Some(now);
                    self.push(card);
                    summary.inserted += 1;
                }
            }
        }

        summary
    }

    /// The table in storage order.
    pub fn into_records(self) -> Vec<CardRecord> {
        self.records
    }

    fn push(&mut self, record: CardRecord) {
        self.index.insert(record.name.clone(), self.records.len());
        self.records.push(record);
    }
}

fn has_key(record: &CardRecord) -> bool {
    !record.name.trim().is_empty()
}

/// Merge timestamp for a batch: local wall-clock time at microsecond
/// precision.
pub fn merge_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Merge `scraped` into `existing` with a single batch timestamp.
pub fn merge_cards(
    existing: Vec<CardRecord>,
    scraped: Vec<CardRecord>,
    now: NaiveDateTime,
) -> (Vec<CardRecord>, MergeSummary) {
    let mut table = CardTable::from_records(existing);
    let summary = table.merge(scraped, now);
    (table.into_records(), summary)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn stored(name: &str, fee: &str, stamp: NaiveDateTime) -> CardRecord {
        CardRecord {
            annual_fee: Some(fee.to_string()),
            created_at: Some(stamp),
            updated_at: Some(stamp),
            ..CardRecord::new(name)
        }
    }

    #[test]
    fn test_update_preserves_created_and_advances_updated() {
        let (t0, t1) = (at(9), at(12));
        let scraped = CardRecord {
            annual_fee: Some("Y".into()),
            ..CardRecord::new("Card A")
        };

        let (merged, summary) = merge_cards(vec![stored("Card A", "X", t0)], vec![scraped], t1);

        assert_eq!(summary.updated, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].annual_fee.as_deref(), Some("Y"));
        assert_eq!(merged[0].created_at, Some(t0));
        assert_eq!(merged[0].updated_at, Some(t1));
    }

    #[test]
    fn test_insert_sets_both_timestamps() {
        let now = at(12);
        let (merged, summary) = merge_cards(vec![], vec![CardRecord::new("Card B")], now);

        assert_eq!(summary.inserted, 1);
        assert_eq!(merged[0].created_at, Some(now));
        assert_eq!(merged[0].updated_at, Some(now));
    }

    #[test]
    fn test_fields_missing_from_scrape_survive() {
        let mut existing = stored("Card A", "X", at(9));
        existing.rank = Some("3".into());
        let scraped = CardRecord {
            point_rate: Some("1.0%".into()),
            ..CardRecord::new("Card A")
        };

        let (merged, _) = merge_cards(vec![existing], vec![scraped], at(12));

        assert_eq!(merged[0].rank.as_deref(), Some("3"));
        assert_eq!(merged[0].annual_fee.as_deref(), Some("X"));
        assert_eq!(merged[0].point_rate.as_deref(), Some("1.0%"));
    }

    #[test]
    fn test_unscraped_cards_are_kept() {
        let (merged, _) = merge_cards(
            vec![stored("Old", "X", at(9))],
            vec![CardRecord::new("New")],
            at(12),
        );

        let names: Vec<_> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Old", "New"]);
        assert_eq!(merged[0].updated_at, Some(at(9)));
    }

    #[test]
    fn test_blank_names_are_skipped() {
        let (merged, summary) = merge_cards(
            vec![CardRecord::new("  ")],
            vec![CardRecord::new(""), CardRecord::new("Card A")],
            at(12),
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_duplicate_in_batch_shares_timestamp() {
        let now = at(12);
        let first = CardRecord {
            annual_fee: Some("X".into()),
            ..CardRecord::new("Card A")
        };
        let second = CardRecord {
            rank: Some("2".into()),
            ..CardRecord::new("Card A")
        };

        let (merged, summary) = merge_cards(vec![], vec![first, second], now);

        assert_eq!(merged.len(), 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(merged[0].annual_fee.as_deref(), Some("X"));
        assert_eq!(merged[0].rank.as_deref(), Some("2"));
        assert_eq!(merged[0].created_at, merged[0].updated_at);
    }

    #[test]
    fn test_legacy_record_without_created_at_gets_one() {
        let mut legacy = CardRecord::new("Card A");
        legacy.updated_at = Some(at(9));

        let (merged, _) = merge_cards(vec![legacy], vec![CardRecord::new("Card A")], at(12));

        assert_eq!(merged[0].created_at, Some(at(12)));
        assert!(merged[0].created_at <= merged[0].updated_at);
    }

    #[test]
    fn test_untyped_stored_timestamps_are_handled() {
        let stored = CardRecord::from_stored(serde_json::json!({
            "name": "Card D",
            "created_at": "2024-05-01T10:00:00+09:00",
            "updated_at": "2024-05-01T10:00:00+09:00"
        }))
        .unwrap();

        let (merged, _) = merge_cards(vec![stored], vec![CardRecord::new("Card D")], at(12));

        assert!(merged[0].created_at.is_none());
        assert_eq!(merged[0].extra["created_at"], "2024-05-01T10:00:00+09:00");
        assert_eq!(merged[0].updated_at, Some(at(12)));
        assert!(!merged[0].extra.contains_key("updated_at"));
    }

    #[test]
    fn test_table_lookup() {
        let table = CardTable::from_records(vec![
            stored("Card A", "X", at(9)),
            stored("Card A", "Y", at(10)),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Card A").unwrap().annual_fee.as_deref(), Some("Y"));
        assert!(table.get("Card B").is_none());
    }

    #[test]
    fn test_merge_timestamp_has_microsecond_precision() {
        use chrono::Timelike;
        assert_eq!(merge_timestamp().nanosecond() % 1_000, 0);
    }
}
