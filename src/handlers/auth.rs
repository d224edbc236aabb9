//! Sign-in and sign-out handlers.

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::auth::{clear_session_cookie, session_cookie, AuthError, LOGIN_PATH};
use crate::errors::ServiceError;
use crate::AppState;

use super::{html_escape, render_page};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET /login/ — the sign-in form.
pub async fn login_form() -> Html<String> {
    Html(render_login_page(None))
}

/// POST /login/ — checks credentials, opens a session, and sends the
/// caller to the dashboard. Bad credentials re-display the form.
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.username, &form.password).await {
        Ok(token) => {
            info!(username = %form.username, "user signed in");
            (
                StatusCode::SEE_OTHER,
                [
                    (header::SET_COOKIE, session_cookie(&token)),
                    (header::LOCATION, "/".to_string()),
                ],
            )
                .into_response()
        }
        Err(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Html(render_login_page(Some("Invalid username or password."))),
        )
            .into_response(),
        Err(err) => ServiceError::from(err).into_response(),
    }
}

/// GET /logout/ — tears down the session cookie and returns to the
/// sign-in page.
pub async fn logout() -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::SET_COOKIE, clear_session_cookie()),
            (header::LOCATION, LOGIN_PATH.to_string()),
        ],
    )
        .into_response()
}

fn render_login_page(error: Option<&str>) -> String {
    let notice = match error {
        Some(message) => format!("<p class=\"error\">{}</p>\n", html_escape(message)),
        None => String::new(),
    };

    let body = format!(
        "<h1>Sign in</h1>\n{notice}\
         <form method=\"post\" action=\"{LOGIN_PATH}\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>\n",
    );

    render_page("Sign in", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_carries_error_notice() {
        let page = render_login_page(Some("Invalid username or password."));
        assert!(page.contains("Invalid username or password."));
        assert!(render_login_page(None).contains("<form"));
    }
}
