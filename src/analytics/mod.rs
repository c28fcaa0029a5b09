//! Expense analytics: normalization, aggregation, and the analytics page.
//!
//! The [record] module turns untrusted JSON expense records into a canonical
//! form, and the [engine] module aggregates canonical records into monthly
//! buckets, per-tag totals, and an overall summary. Both are pure and usable
//! without the web layer. The remaining modules render the analytics page.

mod cards;
mod charts;
pub mod engine;
mod handlers;
pub mod record;

pub use handlers::{AnalyticsPageState, get_analytics_page};
