//! Alerts for displaying success and error messages to users.
//!
//! Alerts are rendered as out-of-band swaps into the alert container that
//! [crate::html::base] places at the bottom of every page, so any HTMX
//! response can attach one.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Reports that an operation succeeded.
    Success {
        /// A short, bold title.
        message: String,
        /// Extra context shown under the title.
        details: String,
    },
    /// Reports that an operation failed and how to proceed.
    Error {
        /// A short, bold title.
        message: String,
        /// Extra context shown under the title.
        details: String,
    },
}

impl Alert {
    /// Create a new success alert.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert without details.
    pub fn error_simple(message: &str) -> Self {
        Self::error(message, "")
    }

    /// Render the alert as an out-of-band swap targeting the alert
    /// container.
    pub fn into_html(self) -> Markup {
        let (message, details, color_style, icon) = match self {
            Alert::Success { message, details } => (
                message,
                details,
                "text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400",
                check_circle_icon(),
            ),
            Alert::Error { message, details } => (
                message,
                details,
                "text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400",
                exclamation_circle_icon(),
            ),
        };

        html! {
            div id="alert-container" hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    id="alert"
                    class={ "flex items-start p-4 mb-4 rounded-lg shadow " (color_style) }
                    role="alert"
                {
                    (icon)

                    div class="ms-3 text-sm font-medium"
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty()
                        {
                            p { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center
                            justify-center h-8 w-8 hover:bg-gray-200 dark:hover:bg-gray-700"
                        aria-label="Close"
                        onclick="document.getElementById('alert').remove();"
                    {
                        span class="sr-only" { "Close" }
                        (close_icon())
                    }
                }

                script
                {
                    (PreEscaped(
                        "setTimeout(() => { \
                            const alert = document.getElementById('alert'); \
                            if (alert) { alert.remove(); } \
                        }, 8000);"
                    ))
                }
            }
        }
    }

    /// Convert the alert into an HTTP response with the given status code.
    pub fn into_response(self, status_code: StatusCode) -> Response {
        (status_code, Html(self.into_html().into_string())).into_response()
    }
}

fn check_circle_icon() -> Markup {
    html! {
        svg
            class="shrink-0 w-4 h-4 mt-0.5"
            aria-hidden="true"
            xmlns="http://www.w3.org/2000/svg"
            fill="currentColor"
            viewBox="0 0 20 20"
        {
            path
                d="M10 .5a9.5 9.5 0 1 0 9.5 9.5A9.51 9.51 0 0 0 10 .5Zm3.707 8.207-4 4a1 1 0 0 1-1.414 0l-2-2a1 1 0 0 1 1.414-1.414L9 10.586l3.293-3.293a1 1 0 0 1 1.414 1.414Z" {}
        }
    }
}

fn exclamation_circle_icon() -> Markup {
    html! {
        svg
            class="shrink-0 w-4 h-4 mt-0.5"
            aria-hidden="true"
            xmlns="http://www.w3.org/2000/svg"
            fill="currentColor"
            viewBox="0 0 20 20"
        {
            path
                d="M10 .5a9.5 9.5 0 1 0 9.5 9.5A9.51 9.51 0 0 0 10 .5ZM10 15a1 1 0 1 1 0-2 1 1 0 0 1 0 2Zm1-4a1 1 0 0 1-2 0V6a1 1 0 0 1 2 0v5Z" {}
        }
    }
}

fn close_icon() -> Markup {
    html! {
        svg
            class="w-3 h-3"
            aria-hidden="true"
            xmlns="http://www.w3.org/2000/svg"
            fill="none"
            viewBox="0 0 14 14"
        {
            path
                stroke="currentColor"
                stroke-linecap="round"
                stroke-linejoin="round"
                stroke-width="2"
                d="m1 1 6 6m0 0 6 6M7 7l6-6M7 7l-6 6" {}
        }
    }
}
