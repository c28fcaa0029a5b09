//! The analytics page handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::{
        cards::summary_cards_view,
        charts::{build_analytics_charts, charts_script, charts_view},
        engine::{AnalyticsReport, aggregate},
        record::CanonicalExpense,
    },
    endpoints,
    expense::{Expense, get_all_expenses},
    html::{HeadElement, PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

/// The state needed for displaying the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsPageState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with charts and summary statistics for the user's expenses.
pub async fn get_analytics_page(
    State(state): State<AnalyticsPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_all_expenses(&connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW);

    if expenses.is_empty() {
        return Ok(analytics_no_data_view(nav_bar).into_response());
    }

    let records: Vec<CanonicalExpense> = expenses.into_iter().map(to_canonical).collect();
    let report = aggregate(&records);

    Ok(analytics_view(nav_bar, &report).into_response())
}

/// Converts a stored expense into the form the aggregation engine consumes.
fn to_canonical(expense: Expense) -> CanonicalExpense {
    CanonicalExpense {
        id: expense.id.to_string(),
        title: expense.description,
        amount: expense.amount,
        tags: expense
            .tags
            .iter()
            .map(|tag| tag.as_ref().to_owned())
            .collect(),
        occurred_at: expense.occurred_at,
    }
}

fn analytics_view(nav_bar: NavBar, report: &AnalyticsReport) -> Markup {
    let nav_bar = nav_bar.into_html();
    let charts = build_analytics_charts(report);

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Analytics" }

            (summary_cards_view(&report.summary))

            (charts_view(&charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&charts),
    ];

    base("Analytics", &scripts, &content)
}

/// Renders the analytics page when no expense data exists.
fn analytics_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_expense_link = link(endpoints::NEW_EXPENSE_VIEW, "manually");
    let import_link = link(endpoints::IMPORT_VIEW, "importing");

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you add some expenses.
                You can add expenses " (new_expense_link) " or
                by " (import_link) "."
            }
        }
    );

    base("Analytics", &[], &content)
}

#[cfg(test)]
mod analytics_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        db::initialize,
        expense::{NewExpense, create_expense},
        tag::TagName,
    };

    use super::{AnalyticsPageState, get_analytics_page};

    fn get_test_state() -> AnalyticsPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        AnalyticsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn analytics_page_renders_cards_and_charts() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            create_expense(
                NewExpense {
                    amount: 10.0,
                    description: "lunch".to_owned(),
                    occurred_at: Some(datetime!(2024-01-05 10:30 UTC)),
                    import_id: None,
                    tags: vec![TagName::new_unchecked("food")],
                },
                &conn,
            )
            .unwrap();
            create_expense(
                NewExpense {
                    amount: 20.0,
                    description: "train".to_owned(),
                    occurred_at: Some(datetime!(2024-02-10 08:00 UTC)),
                    import_id: None,
                    tags: vec![TagName::new_unchecked("travel")],
                },
                &conn,
            )
            .unwrap();
        }

        let response = get_analytics_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        assert_valid_html(&html);
        assert_element_exists(&html, "#monthly-spending-chart");
        assert_element_exists(&html, "#spending-by-tag-chart");

        let text = html.html();
        assert!(text.contains("$30.00"), "total card missing in {text}");
        assert!(text.contains("$15.00"), "average card missing in {text}");
    }

    #[tokio::test]
    async fn analytics_page_counts_dateless_expenses_in_summary() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            create_expense(
                NewExpense {
                    amount: 5.0,
                    description: "mystery".to_owned(),
                    occurred_at: None,
                    import_id: Some("abc".to_owned()),
                    tags: vec![],
                },
                &conn,
            )
            .unwrap();
        }

        let response = get_analytics_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        let text = html.html();
        assert!(text.contains("$5.00"), "total card missing in {text}");
    }

    #[tokio::test]
    async fn displays_prompt_text_on_no_data() {
        let state = get_test_state();

        let response = get_analytics_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        assert!(html.html().contains("Nothing here yet"));
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn assert_element_exists(html: &Html, selector: &str) {
        let selector = Selector::parse(selector).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "Element '{selector:?}' not found"
        );
    }
}
