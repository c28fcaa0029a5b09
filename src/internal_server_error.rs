//! The page to display when an internal server error occurs.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub fn render_internal_server_error(description: &str, fix: &str) -> Response {
    let page = error_view("Internal Server Error", "500", description, fix);

    (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(
        "Sorry, something went wrong.",
        "Try again later or check the server logs",
    )
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::http::StatusCode;

    use super::render_internal_server_error;

    #[test]
    fn response_has_internal_server_error_status() {
        let response = render_internal_server_error("oops", "try again");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
