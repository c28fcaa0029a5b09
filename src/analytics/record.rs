//! Normalization of untrusted expense records.
//!
//! JSON exports from other expense trackers are messy: amounts may be
//! numbers or strings, tags may be plain strings or objects, and the
//! timestamp may hide under one of several field names. [RawExpense]
//! deserializes whatever shape the export has and [RawExpense::normalize]
//! turns it into a [CanonicalExpense] that is safe to aggregate.
//!
//! Normalization is total: malformed fields degrade to neutral defaults
//! instead of raising errors, so aggregation downstream never fails.

use serde::Deserialize;
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// An untrusted expense record as it appears in a JSON export.
///
/// Every field is optional and unknown fields are ignored, so any JSON
/// object deserializes successfully.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExpense {
    /// An identifier assigned by the exporting application.
    pub id: Option<Value>,
    /// What the expense was for.
    pub title: Option<String>,
    /// The amount of money spent, as a number or a numeric string.
    pub amount: Option<RawAmount>,
    /// The tags attached to the expense.
    pub tags: Option<Vec<RawTag>>,
    /// The preferred timestamp field.
    pub timestamp: Option<String>,
    /// A fallback timestamp field used by some exporters.
    pub created_at: Option<String>,
    /// The camel case spelling of `created_at` used by some exporters.
    #[serde(rename = "createdAt")]
    pub created_at_camel: Option<String>,
    /// A date-only fallback timestamp field.
    pub date: Option<String>,
}

/// An expense amount that may be a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number, e.g. `12.5`.
    Number(f64),
    /// A numeric string, e.g. `"12.5"`.
    Text(String),
}

/// A tag entry that may be a plain string or an object with a `name` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    /// A plain tag name, e.g. `"food"`.
    Name(String),
    /// A tag object, e.g. `{"name": "food"}`.
    Object {
        /// The name of the tag.
        name: String,
    },
    /// Anything else, which normalization drops.
    Other(Value),
}

/// A normalized, safe-to-aggregate expense record.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalExpense {
    /// The exporting application's identifier, or an empty string.
    pub id: String,
    /// What the expense was for, or an empty string.
    pub title: String,
    /// The amount of money spent. Always finite; unparseable amounts
    /// normalize to zero.
    pub amount: f64,
    /// The tag names in source order with empty entries dropped. Duplicates
    /// are preserved.
    pub tags: Vec<String>,
    /// When the money was spent, or `None` if no timestamp field parsed.
    ///
    /// Records without a timestamp are excluded from monthly aggregation
    /// but still count towards tag and portfolio aggregates.
    pub occurred_at: Option<OffsetDateTime>,
}

impl RawExpense {
    /// Convert the raw record into its canonical form.
    ///
    /// This never fails. Missing or malformed fields degrade to defaults:
    /// an unparseable amount becomes `0.0`, tags that are not strings or
    /// `{name}` objects are dropped, and an unparseable timestamp leaves
    /// `occurred_at` as `None`.
    pub fn normalize(self) -> CanonicalExpense {
        let amount = match self.amount {
            Some(RawAmount::Number(number)) if number.is_finite() => number,
            // f64's parser accepts "NaN" and "inf", which must degrade to
            // zero like any other unusable amount.
            Some(RawAmount::Text(text)) => text
                .trim()
                .parse()
                .ok()
                .filter(|number: &f64| number.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        };

        let tags = self
            .tags
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tag| {
                let name = match tag {
                    RawTag::Name(name) => name,
                    RawTag::Object { name } => name,
                    RawTag::Other(_) => return None,
                };
                let name = name.trim().to_owned();

                if name.is_empty() { None } else { Some(name) }
            })
            .collect();

        // The first alias that parses wins, in this fixed precedence order.
        let occurred_at = [
            self.timestamp,
            self.created_at,
            self.created_at_camel,
            self.date,
        ]
        .into_iter()
        .flatten()
        .find_map(|text| parse_timestamp(&text));

        let id = match self.id {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };

        CanonicalExpense {
            id,
            title: self.title.unwrap_or_default(),
            amount,
            tags,
            occurred_at,
        }
    }
}

fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date_time);
    }

    let date_time_format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(date_time) = PrimitiveDateTime::parse(text, date_time_format) {
        return Some(date_time.assume_utc());
    }

    let date_format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(text, date_format) {
        return Some(date.midnight().assume_utc());
    }

    None
}
