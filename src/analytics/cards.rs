//! Summary cards for the analytics page.

use maud::{Markup, html};

use crate::{analytics::engine::PortfolioSummary, html::format_currency};

/// Renders the row of summary cards above the charts.
pub(super) fn summary_cards_view(summary: &PortfolioSummary) -> Markup {
    html! {
        section class="w-full mx-auto mb-4" {
            div class="grid grid-cols-1 sm:grid-cols-3 gap-4" {
                (summary_card("Expenses", &summary.count.to_string()))
                (summary_card("Total Spent", &format_currency(summary.total_amount)))
                (summary_card("Average Expense", &format_currency(summary.average_amount)))
            }
        }
    }
}

fn summary_card(label: &str, value: &str) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                dark:border-gray-700 rounded-lg p-4 shadow-md"
        {
            div class="text-sm text-gray-600 dark:text-gray-400 mb-1" {
                (label)
            }
            div class="text-3xl font-bold" data-summary-value=(label) {
                (value)
            }
        }
    }
}
