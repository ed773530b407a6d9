//! Item and review records.
//!
//! Tables arrive as string records (one map per row). [`RawItem`] and
//! [`Review`] pick their fields out of a record, accepting the column names
//! used by the upstream export as aliases. Numeric parsing happens once, in
//! [`RawItem::parse`], under an explicit [`NumericPolicy`].

use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One table row, column name -> cell text
pub type Record = AHashMap<String, String>;

pub const ITEM_TABLE: &str = "item";
pub const REVIEW_TABLE: &str = "review";

// (canonical name, accepted aliases)
const ITEM_COLUMNS: &[(&str, &[&str])] = &[
    ("id", &["id", "business_id", "BizId"]),
    ("name", &["name", "restaurant_name", "Name"]),
    ("categories", &["categories", "Categories"]),
    ("location", &["location", "neighborhood", "Neighborhoods_0"]),
    ("price", &["price", "price_range", "PriceRange"]),
    ("rating", &["rating", "Rating"]),
    ("review_count", &["review_count", "ReviewCount"]),
    ("rank", &["rank", "ranking", "Ranking"]),
];

const REVIEW_COLUMNS: &[(&str, &[&str])] = &[
    ("business_id", &["business_id", "BizId"]),
    ("language", &["language", "lang"]),
    ("text", &["text"]),
];

pub const DEFAULT_PRICE_SYMBOLS: &str = "$€£¥";

fn field<'a>(
    record: &'a Record,
    table: &str,
    columns: &[(&str, &[&str])],
    name: &str,
) -> Result<&'a str> {
    let aliases = columns
        .iter()
        .find(|(canonical, _)| *canonical == name)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[]);
    aliases
        .iter()
        .find_map(|alias| record.get(*alias))
        .map(String::as_str)
        .ok_or_else(|| Error::missing_field(table, name))
}

/// Check a header row once, before any record is parsed.
pub fn validate_item_columns<S: AsRef<str>>(headers: &[S]) -> Result<()> {
    validate_columns(headers, ITEM_TABLE, ITEM_COLUMNS)
}

pub fn validate_review_columns<S: AsRef<str>>(headers: &[S]) -> Result<()> {
    validate_columns(headers, REVIEW_TABLE, REVIEW_COLUMNS)
}

fn validate_columns<S: AsRef<str>>(
    headers: &[S],
    table: &str,
    columns: &[(&str, &[&str])],
) -> Result<()> {
    for (canonical, aliases) in columns {
        let present = headers
            .iter()
            .any(|h| aliases.contains(&h.as_ref().trim()));
        if !present {
            return Err(Error::missing_field(table, canonical));
        }
    }
    Ok(())
}

/// What to do with a rating/review_count/rank cell that is not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Abort the build with [`Error::NumericParse`]
    #[default]
    Strict,
    /// Substitute 0 and log a warning
    CoerceToZero,
}

/// An item row before numeric parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub name: String,
    pub categories: String,
    pub location: String,
    pub price: String,
    pub rating: String,
    pub review_count: String,
    pub rank: String,
}

impl RawItem {
    pub fn from_record(record: &Record) -> Result<Self> {
        let get = |name| field(record, ITEM_TABLE, ITEM_COLUMNS, name).map(str::to_string);
        Ok(Self {
            id: get("id")?.trim().to_string(),
            name: get("name")?.trim().to_string(),
            categories: get("categories")?,
            location: get("location")?,
            price: get("price")?,
            rating: get("rating")?,
            review_count: get("review_count")?,
            rank: get("rank")?,
        })
    }

    /// Parse numeric fields; `tags` stays empty until the tag builder runs.
    ///
    /// `rating` must be a finite number in `[0, 5]`; `review_count` and `rank`
    /// must be whole numbers (`review_count` non-negative).
    pub fn parse(self, policy: NumericPolicy, price_symbols: &str) -> Result<Item> {
        let rating: f32 = parse_field(&self.id, "rating", &self.rating, policy, |r: &f32| {
            r.is_finite() && (MIN_RATING..=MAX_RATING).contains(r)
        })?;
        let review_count: u64 =
            parse_field(&self.id, "review_count", &self.review_count, policy, |_| true)?;
        let rank: i64 = parse_field(&self.id, "rank", &self.rank, policy, |_| true)?;

        Ok(Item {
            price_tier: price_tier(&self.price, price_symbols),
            categories: split_categories(&self.categories),
            location: self.location.trim().to_string(),
            id: self.id,
            name: self.name,
            price: self.price.trim().to_string(),
            rating,
            review_count,
            rank,
            tags: String::new(),
        })
    }
}

pub const MIN_RATING: f32 = 0.0;
pub const MAX_RATING: f32 = 5.0;

fn parse_field<T, F>(
    item: &str,
    field: &'static str,
    value: &str,
    policy: NumericPolicy,
    valid: F,
) -> Result<T>
where
    T: FromStr + Default,
    F: Fn(&T) -> bool,
{
    match value.trim().parse::<T>() {
        Ok(v) if valid(&v) => Ok(v),
        _ => match policy {
            NumericPolicy::Strict => Err(Error::NumericParse {
                item: item.to_string(),
                field,
                value: value.to_string(),
            }),
            NumericPolicy::CoerceToZero => {
                tracing::warn!(item, field, value, "malformed numeric value coerced to 0");
                Ok(T::default())
            }
        },
    }
}

/// Count of price-symbol characters, e.g. `"$$$"` -> 3
pub fn price_tier(price: &str, symbols: &str) -> u32 {
    price.chars().filter(|c| symbols.contains(*c)).count() as u32
}

/// Split a category cell such as `"Italian, Pizza"` or `"['Italian', 'Pizza']"`.
pub fn split_categories(cell: &str) -> Vec<String> {
    cell.split([',', '|'])
        .map(|part| {
            part.trim_matches(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '\'' | '"'))
                .to_string()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// A parsed corpus item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub categories: Vec<String>,
    pub location: String,
    /// Price text as given, e.g. `"$$"`
    pub price: String,
    pub price_tier: u32,
    pub rating: f32,
    pub review_count: u64,
    pub rank: i64,
    /// Stemmed, lowercased text blob
    pub tags: String,
}

impl Item {
    /// `[price_tier, rating, review_count, rank]`
    pub fn numeric_features(&self) -> [f64; 4] {
        [
            self.price_tier as f64,
            self.rating as f64,
            self.review_count as f64,
            self.rank as f64,
        ]
    }
}

/// A review row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub business_id: String,
    pub language: String,
    pub text: String,
}

impl Review {
    pub fn from_record(record: &Record) -> Result<Self> {
        let get = |name| field(record, REVIEW_TABLE, REVIEW_COLUMNS, name);
        Ok(Self {
            business_id: get("business_id")?.trim().to_string(),
            language: get("language")?.trim().to_string(),
            text: get("text")?.to_string(),
        })
    }
}
