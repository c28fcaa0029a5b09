//! The registration page for creating a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, PasswordHash, ValidatedPassword,
    app_state::create_cookie_key,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, link,
        loading_spinner, log_in_register, password_input, text_input,
    },
    user::create_user,
};

use crate::AppState;

/// The minimum number of characters the password should have to be
/// considered valid on the client side (server-side validation is done on
/// top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(
    username: &str,
    username_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target="this"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, username_error_message))
            (password_input("password", "Password", PASSWORD_INPUT_MIN_LENGTH, password_error_message))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", None, None, None);
    let content = log_in_register("Create an account", &registration_form);
    let page = base("Register", &[], &content);

    (StatusCode::OK, Html(page.into_string())).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection to insert new users into.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name the new account will log in with.
    pub username: String,
    /// The password for the new account.
    pub password: String,
    /// A second copy of the password, to catch typos.
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// On success the client is redirected to the log in page. Otherwise, the
/// form is returned with an error message explaining the problem.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() {
        return registration_form_response(
            username,
            Some("Username cannot be empty."),
            None,
            None,
        );
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form_response(
                username,
                None,
                Some(error.to_string().as_ref()),
                None,
            );
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form_response(username, None, None, Some("Passwords do not match"));
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_user(username, password_hash, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateUsername) => registration_form_response(
            username,
            Some("That username is already taken, choose another."),
            None,
            None,
        ),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            error.into_response()
        }
    }
}

fn registration_form_response(
    username: &str,
    username_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Response {
    let form = registration_form(
        username,
        username_error_message,
        password_error_message,
        confirm_password_error_message,
    );

    (StatusCode::OK, Html(form.into_string())).into_response()
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::{StatusCode, header::CONTENT_TYPE};
    use scraper::Html;

    use crate::{endpoints, register_user::get_register_page};

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let document = Html::parse_document(&text);
        assert!(
            document.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            document.errors
        );

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::USERS));

        let password_selector = scraper::Selector::parse("input[type=password]").unwrap();
        let password_inputs = form.select(&password_selector).collect::<Vec<_>>();
        assert_eq!(
            password_inputs.len(),
            2,
            "want 2 password inputs, got {}",
            password_inputs.len()
        );
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{endpoints, user::create_user_table};

    use super::{RegisterForm, RegistrationState, register_user};

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        RegistrationState::new("foobar", Arc::new(Mutex::new(connection)))
    }

    #[tokio::test]
    async fn register_redirects_to_log_in_on_success() {
        let state = get_test_state();
        let form = RegisterForm {
            username: "alice".to_owned(),
            password: "averystrongpassword".to_owned(),
            confirm_password: "averystrongpassword".to_owned(),
        };

        let response = register_user(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::LOG_IN_VIEW
        );
    }

    #[tokio::test]
    async fn register_fails_with_weak_password() {
        let state = get_test_state();
        let form = RegisterForm {
            username: "alice".to_owned(),
            password: "password1234".to_owned(),
            confirm_password: "password1234".to_owned(),
        };

        let response = register_user(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains(response, "password").await;
    }

    #[tokio::test]
    async fn register_fails_with_mismatched_passwords() {
        let state = get_test_state();
        let form = RegisterForm {
            username: "alice".to_owned(),
            password: "averystrongpassword".to_owned(),
            confirm_password: "adifferentpassword".to_owned(),
        };

        let response = register_user(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains(response, "Passwords do not match").await;
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_username() {
        let state = get_test_state();
        let form = RegisterForm {
            username: "alice".to_owned(),
            password: "averystrongpassword".to_owned(),
            confirm_password: "averystrongpassword".to_owned(),
        };
        register_user(State(state.clone()), Form(form)).await;

        let form = RegisterForm {
            username: "alice".to_owned(),
            password: "anotherstrongpassword".to_owned(),
            confirm_password: "anotherstrongpassword".to_owned(),
        };
        let response = register_user(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains(response, "already taken").await;
    }

    async fn assert_body_contains(response: axum::response::Response, message: &str) {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        assert!(
            text.contains(message),
            "response body should contain the text '{}' but got {}",
            message,
            text
        );
    }
}
