//! The aggregation engine that derives every summary view from a snapshot
//! of canonical expense records.
//!
//! [aggregate] is a pure function: it never fails, performs no I/O, and
//! recomputes the full report from scratch on every call. For a personal
//! expense tracker the record count is small, so full recomputation is
//! cheaper than the bugs an incremental scheme would invite.

use std::collections::{BTreeMap, HashMap};

use super::record::CanonicalExpense;

/// The spending total for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    /// The zero-padded month key, e.g. "2024-01". Lexicographic order on
    /// this key is chronological order.
    pub month_key: String,
    /// A human readable label, e.g. "January 2024".
    pub label: String,
    /// The total spend for the month, rounded to cents.
    pub total: f64,
}

/// The rollup of spending for one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagAggregate {
    /// The name of the tag.
    pub name: String,
    /// The total spend across records carrying the tag, rounded to cents.
    pub total: f64,
    /// How many records carry the tag. A tag listed twice on one record
    /// counts that record once.
    pub count: u64,
    /// The tag's fraction of the sum of all tag totals, in `[0, 1]`.
    pub share: f64,
}

/// Portfolio-level statistics over every record.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    /// The number of records, dated or not.
    pub count: u64,
    /// The sum of all amounts, unrounded.
    pub total_amount: f64,
    /// `total_amount / count`, or zero when there are no records.
    pub average_amount: f64,
}

/// Everything the analytics page needs, derived in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    /// Per-month totals in ascending month order. Records without a date
    /// are excluded from this view only.
    pub monthly: Vec<MonthlyBucket>,
    /// Per-tag rollups in order of first appearance.
    ///
    /// Tag totals are not a partition of spend: a record with two tags
    /// contributes its full amount to both.
    pub tags: Vec<TagAggregate>,
    /// Portfolio-level statistics.
    pub summary: PortfolioSummary,
}

/// Round to two decimal places, half away from zero.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Derive the monthly, tag and portfolio views from `records`.
///
/// The function is total: any input produces a report, and an empty input
/// produces empty series with a zeroed summary.
pub fn aggregate(records: &[CanonicalExpense]) -> AnalyticsReport {
    AnalyticsReport {
        monthly: aggregate_monthly(records),
        tags: aggregate_tags(records),
        summary: summarize(records),
    }
}

fn aggregate_monthly(records: &[CanonicalExpense]) -> Vec<MonthlyBucket> {
    // (year, month) keys sort chronologically, matching the string keys.
    let mut buckets: BTreeMap<(i32, u8), f64> = BTreeMap::new();

    for record in records {
        let Some(occurred_at) = record.occurred_at else {
            continue;
        };

        let key = (occurred_at.year(), occurred_at.month() as u8);
        *buckets.entry(key).or_insert(0.0) += record.amount;
    }

    buckets
        .into_iter()
        .map(|((year, month), total)| MonthlyBucket {
            month_key: format!("{year:04}-{month:02}"),
            label: month_label(year, month),
            total: round_to_cents(total),
        })
        .collect()
}

fn month_label(year: i32, month: u8) -> String {
    let month_name = time::Month::try_from(month)
        .map(|month| month.to_string())
        .unwrap_or_default();

    format!("{month_name} {year}")
}

fn aggregate_tags(records: &[CanonicalExpense]) -> Vec<TagAggregate> {
    let mut aggregates: Vec<TagAggregate> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for record in records {
        // A tag listed twice on one record counts the record once and takes
        // its amount once.
        let mut seen_in_record: Vec<&str> = Vec::new();

        for name in &record.tags {
            if seen_in_record.contains(&name.as_str()) {
                continue;
            }
            seen_in_record.push(name);

            match index_by_name.get(name.as_str()) {
                Some(&index) => {
                    aggregates[index].total += record.amount;
                    aggregates[index].count += 1;
                }
                None => {
                    index_by_name.insert(name.clone(), aggregates.len());
                    aggregates.push(TagAggregate {
                        name: name.clone(),
                        total: record.amount,
                        count: 1,
                        share: 0.0,
                    });
                }
            }
        }
    }

    let mut total_sum = 0.0;
    for aggregate in &mut aggregates {
        aggregate.total = round_to_cents(aggregate.total);
        total_sum += aggregate.total;
    }

    // Floor the divisor at one when the true sum is zero so that shares are
    // defined (and zero) instead of dividing by zero.
    let divisor = if total_sum == 0.0 { 1.0 } else { total_sum };
    for aggregate in &mut aggregates {
        aggregate.share = aggregate.total / divisor;
    }

    aggregates
}

fn summarize(records: &[CanonicalExpense]) -> PortfolioSummary {
    let count = records.len() as u64;
    let total_amount: f64 = records.iter().map(|record| record.amount).sum();
    let average_amount = if count > 0 {
        total_amount / count as f64
    } else {
        0.0
    };

    PortfolioSummary {
        count,
        total_amount,
        average_amount,
    }
}
