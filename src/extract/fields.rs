//! Tolerant text-to-value parsers for product card fields
//!
//! Every parser here is total: unparseable input yields `None` (or the input
//! unchanged, for image URLs), never an error.

use crate::url::strip_query;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::LazyLock;

static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").expect("rating regex is valid"));

static RATINGS_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\s*ratings?").expect("ratings regex is valid"));

static REVIEWS_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\s*reviews?").expect("reviews regex is valid"));

static DISCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*%").expect("discount regex is valid"));

static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("li selector is valid"));

/// Currency symbols removed before parsing a price
const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£'];

/// Parses a price such as `"₹1,234"` into `1234`
///
/// Currency symbols, thousands separators and whitespace are stripped, then the
/// leading integer is read. Anything after it (paise, decimals) is ignored.
pub fn parse_price(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    let sign_len = usize::from(cleaned.starts_with(['-', '+']));
    let digits = cleaned[sign_len..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }

    cleaned[..sign_len + digits].parse().ok()
}

/// Extracts the first decimal number, e.g. `"4.3★"` → `4.3`
pub fn parse_rating(raw: &str) -> Option<f64> {
    RATING_RE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|rating| rating.is_finite())
}

/// Rating and review totals read from one combined label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingCounts {
    pub ratings: Option<u64>,
    pub reviews: Option<u64>,
}

/// Parses labels such as `"21 Ratings & 3 Reviews"`
///
/// The two numbers are matched independently and case-insensitively, so either
/// may be present without the other.
pub fn parse_rating_counts(raw: &str) -> RatingCounts {
    RatingCounts {
        ratings: count_before(&RATINGS_COUNT_RE, raw),
        reviews: count_before(&REVIEWS_COUNT_RE, raw),
    }
}

fn count_before(re: &Regex, raw: &str) -> Option<u64> {
    re.captures(raw)
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
}

/// Reads the integer right before a percent sign, e.g. `"23% off"` → `23`
///
/// Values above 100 are not a discount and come back as `None`.
pub fn parse_discount(raw: &str) -> Option<u8> {
    DISCOUNT_RE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|percent| *percent <= 100)
        .and_then(|percent| u8::try_from(percent).ok())
}

/// Drops the query string of an image URL; relative or malformed input is kept
pub fn normalize_image_url(raw: &str) -> String {
    strip_query(raw.trim())
}

/// Free-text key/value pairs in the order they appeared on the card
///
/// Inserting an existing key replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specifications(Vec<(String, String)>);

impl Specifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for Specifications {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Splits specification lines into key/value pairs
///
/// Each line is split on its first `:`, otherwise on its first `" - "`. Lines
/// without either separator are stored under `spec_{n}`, where `n` is one more
/// than the number of entries collected so far. Blank lines are skipped.
/// Returns `None` when no entry was collected.
pub fn parse_specification_items<I, S>(items: I) -> Option<Specifications>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut specs = Specifications::new();

    for item in items {
        let text = item.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        let split = text.split_once(':').or_else(|| text.split_once(" - "));
        match split {
            Some((key, value)) => specs.insert(key.trim().to_string(), value.trim().to_string()),
            None => {
                let key = format!("spec_{}", specs.len() + 1);
                specs.insert(key, text.to_string());
            }
        }
    }

    (!specs.is_empty()).then_some(specs)
}

/// Parses the `li` children of a specification list element
pub fn parse_specification_list(container: ElementRef<'_>) -> Option<Specifications> {
    parse_specification_items(
        container
            .select(&LIST_ITEM)
            .map(|li| li.text().collect::<String>()),
    )
}
