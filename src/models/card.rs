//! Card record data structures.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One credit card scraped from a listing page.
///
/// `name` is the merge key. Every other field is optional and omitted from the
/// JSON form when absent, so a stored object only carries what was extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card display name
    pub name: String,

    /// Primary card image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Absolute URL of the card's detail page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,

    /// Ranking badge text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_fee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_rate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_text: Option<String>,

    /// International payment brands, in page order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<Brand>>,

    /// Short feature blurbs, in page order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    /// Set once, when the card first enters the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,

    /// Refreshed on every merge that touches the card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,

    /// Keys this version does not know about, kept as-is on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keys backed by a typed field on [`CardRecord`], other than `name`.
const TYPED_KEYS: [&str; 11] = [
    "image_url",
    "detail_url",
    "rank",
    "annual_fee",
    "point_rate",
    "introduction_title",
    "introduction_text",
    "brands",
    "features",
    "created_at",
    "updated_at",
];

/// An international brand (Visa, JCB, ...) attached to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(default)]
    pub name: String,
    pub image_url: String,
}

impl CardRecord {
    /// Create a record carrying only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Read a stored card without losing data.
    ///
    /// Any object with a non-blank string `name` is accepted. A known key whose
    /// value does not fit its typed field (a numeric `rank`, a timestamp with
    /// an offset, ...) is kept verbatim in `extra` and written back unchanged.
    pub fn from_stored(value: Value) -> Option<Self> {
        let Value::Object(mut object) = value else {
            return None;
        };
        let name = match object.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            _ => return None,
        };

        let mut misfits = Map::new();
        for key in TYPED_KEYS {
            let Some(field) = object.get(key) else {
                continue;
            };
            let mut single = Map::new();
            single.insert("name".to_string(), Value::String(name.clone()));
            single.insert(key.to_string(), field.clone());
            if serde_json::from_value::<Self>(Value::Object(single)).is_err() {
                if let Some(raw) = object.remove(key) {
                    misfits.insert(key.to_string(), raw);
                }
            }
        }

        let mut card: Self = serde_json::from_value(Value::Object(object)).ok()?;
        if !misfits.is_empty() {
            log::debug!(
                "Keeping untyped fields {:?} of stored card '{}' as-is",
                misfits.keys().collect::<Vec<_>>(),
                card.name
            );
        }
        card.extra.extend(misfits);
        Some(card)
    }

    /// Set `created_at` unless the card already carries one, typed or not.
    pub fn stamp_created(&mut self, now: NaiveDateTime) {
        if self.created_at.is_none() && !self.extra.contains_key("created_at") {
            self.created_at = Some(now);
        }
    }

    /// Set `updated_at`, replacing any untyped stored value.
    pub fn stamp_updated(&mut self, now: NaiveDateTime) {
        self.extra.remove("updated_at");
        self.updated_at = Some(now);
    }

    /// Shallow-merge a newer scrape of the same card into this record.
    ///
    /// Fields present in `newer` replace ours, including an untyped stored
    /// value under the same key; fields absent in `newer` are left untouched.
    /// Timestamps are owned by the merge engine and are not copied.
    pub fn merge_from(&mut self, newer: CardRecord) {
        fn take<T>(
            extra: &mut Map<String, Value>,
            key: &str,
            slot: &mut Option<T>,
            value: Option<T>,
        ) {
            if value.is_some() {
                extra.remove(key);
                *slot = value;
            }
        }

        let extra = &mut self.extra;
        take(extra, "image_url", &mut self.image_url, newer.image_url);
        take(extra, "detail_url", &mut self.detail_url, newer.detail_url);
        take(extra, "rank", &mut self.rank, newer.rank);
        take(extra, "annual_fee", &mut self.annual_fee, newer.annual_fee);
        take(extra, "point_rate", &mut self.point_rate, newer.point_rate);
        take(
            extra,
            "introduction_title",
            &mut self.introduction_title,
            newer.introduction_title,
        );
        take(
            extra,
            "introduction_text",
            &mut self.introduction_text,
            newer.introduction_text,
        );
        take(extra, "brands", &mut self.brands, newer.brands);
        take(extra, "features", &mut self.features, newer.features);
        extra.extend(newer.extra);
    }

    /// Image URLs of every brand attached to this card.
    pub fn brand_image_urls(&self) -> impl Iterator<Item = &str> {
        self.brands
            .iter()
            .flatten()
            .map(|brand| brand.image_url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_present_fields_only() {
        let mut stored = CardRecord {
            annual_fee: Some("X".into()),
            rank: Some("1".into()),
            ..CardRecord::new("Card A")
        };
        let scraped = CardRecord {
            annual_fee: Some("Y".into()),
            ..CardRecord::new("Card A")
        };

        stored.merge_from(scraped);

        assert_eq!(stored.annual_fee.as_deref(), Some("Y"));
        assert_eq!(stored.rank.as_deref(), Some("1"));
    }

    #[test]
    fn test_merge_replaces_lists_wholesale() {
        let mut stored = CardRecord {
            features: Some(vec!["a".into(), "b".into()]),
            ..CardRecord::new("Card A")
        };
        let scraped = CardRecord {
            features: Some(vec![]),
            ..CardRecord::new("Card A")
        };

        stored.merge_from(scraped);
        assert_eq!(stored.features, Some(vec![]));
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let json = serde_json::to_value(CardRecord::new("Card A")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Card A" }));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = serde_json::json!({
            "name": "Card A",
            "annual_fee": "無料",
            "campaign": { "until": "2025-01-31" }
        });

        let card: CardRecord = serde_json::from_value(raw.clone()).unwrap();
        assert!(card.extra.contains_key("campaign"));
        assert_eq!(serde_json::to_value(&card).unwrap(), raw);
    }

    #[test]
    fn test_reads_python_style_timestamps() {
        let raw = serde_json::json!({
            "name": "Card A",
            "created_at": "2024-05-01T10:20:30.123456",
            "updated_at": "2024-05-02T08:00:00.000001"
        });

        let card: CardRecord = serde_json::from_value(raw).unwrap();
        assert!(card.created_at.unwrap() < card.updated_at.unwrap());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let raw = serde_json::json!({ "annual_fee": "無料" });
        assert!(serde_json::from_value::<CardRecord>(raw).is_err());
    }

    #[test]
    fn test_from_stored_keeps_mistyped_fields_verbatim() {
        let raw = serde_json::json!({
            "name": "Card A",
            "rank": 1,
            "annual_fee": "無料",
            "brands": [{ "name": "VISA" }],
            "created_at": "2024-05-01T10:00:00+09:00"
        });

        let card = CardRecord::from_stored(raw.clone()).unwrap();
        assert_eq!(card.annual_fee.as_deref(), Some("無料"));
        assert!(card.rank.is_none());
        assert!(card.brands.is_none());
        assert!(card.created_at.is_none());
        assert_eq!(serde_json::to_value(&card).unwrap(), raw);
    }

    #[test]
    fn test_from_stored_requires_string_name() {
        assert!(CardRecord::from_stored(serde_json::json!({ "rank": "1" })).is_none());
        assert!(CardRecord::from_stored(serde_json::json!({ "name": 7 })).is_none());
        assert!(CardRecord::from_stored(serde_json::json!({ "name": " " })).is_none());
        assert!(CardRecord::from_stored(serde_json::json!("Card A")).is_none());
    }

    #[test]
    fn test_scraped_value_replaces_untyped_stored_value() {
        let mut stored =
            CardRecord::from_stored(serde_json::json!({ "name": "Card A", "rank": 1 })).unwrap();
        stored.merge_from(CardRecord {
            rank: Some("2".into()),
            ..CardRecord::new("Card A")
        });

        assert_eq!(stored.rank.as_deref(), Some("2"));
        assert!(!stored.extra.contains_key("rank"));
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["rank"], "2");
    }

    #[test]
    fn test_stamps_respect_untyped_timestamps() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut card = CardRecord::from_stored(serde_json::json!({
            "name": "Card D",
            "created_at": "2024-05-01T10:00:00+09:00",
            "updated_at": "2024-05-01T10:00:00+09:00"
        }))
        .unwrap();

        card.stamp_created(now);
        card.stamp_updated(now);

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T10:00:00+09:00");
        assert_eq!(json["updated_at"], "2024-06-01T12:00:00");
    }

    #[test]
    fn test_brand_image_urls() {
        let card = CardRecord {
            brands: Some(vec![
                Brand {
                    name: "VISA".into(),
                    image_url: "https://img.example.com/visa.png".into(),
                },
                Brand {
                    name: "JCB".into(),
                    image_url: "https://img.example.com/jcb.png".into(),
                },
            ]),
            ..CardRecord::new("Card A")
        };

        let urls: Vec<_> = card.brand_image_urls().collect();
        assert_eq!(
            urls,
            vec![
                "https://img.example.com/visa.png",
                "https://img.example.com/jcb.png"
            ]
        );
    }
}
