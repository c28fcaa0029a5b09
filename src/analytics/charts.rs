//! Chart generation and rendering for the analytics page.
//!
//! Builds two ECharts visualizations from an [AnalyticsReport]:
//! - **Monthly Spending**: bar chart of spending totals per calendar month
//! - **Spending by Tag**: pie chart of per-tag spending totals
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::{Pie, bar::Bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    analytics::engine::{AnalyticsReport, MonthlyBucket, TagAggregate},
    html::HeadElement,
};

/// An analytics chart with its HTML container ID and ECharts configuration.
pub(super) struct AnalyticsChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Creates the array of analytics charts from an aggregated report.
pub(super) fn build_analytics_charts(report: &AnalyticsReport) -> [AnalyticsChart; 2] {
    [
        AnalyticsChart {
            id: "monthly-spending-chart",
            options: monthly_chart(&report.monthly).to_string(),
        },
        AnalyticsChart {
            id: "spending-by-tag-chart",
            options: tags_chart(&report.tags).to_string(),
        },
    ]
}

/// Renders the HTML containers for the analytics charts.
pub(super) fn charts_view(charts: &[AnalyticsChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for the analytics charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[AnalyticsChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn monthly_chart(monthly: &[MonthlyBucket]) -> Chart {
    let labels: Vec<String> = monthly.iter().map(|bucket| bucket.label.clone()).collect();
    let totals: Vec<f64> = monthly.iter().map(|bucket| bucket.total).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Monthly Spending")
                .subtext("Months with at least one dated expense"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spending").data(totals))
}

fn tags_chart(tags: &[TagAggregate]) -> Chart {
    let data: Vec<(f64, &str)> = tags
        .iter()
        .map(|aggregate| (aggregate.total, aggregate.name.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by Tag"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .series(Pie::new().name("Spending").radius("60%").data(data))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}
