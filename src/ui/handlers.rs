//! Web UI handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use minijinja::context;

use crate::auth::models::MAX_USERNAME_LEN;
use crate::auth::SessionContext;
use crate::error::Result;

use super::Pages;

const TITLE: &str = "Gatehouse";

/// Home page with the register and login forms
pub async fn home(State(pages): State<Pages>) -> Result<Html<String>> {
    pages.render(
        "index.html",
        context! { title => TITLE, max_username => MAX_USERNAME_LEN },
    )
}

/// Dashboard for an authenticated session
pub async fn dashboard(State(pages): State<Pages>, ctx: SessionContext) -> Result<Html<String>> {
    let username = ctx.user().map(|user| user.username.as_str()).unwrap_or_default();
    pages.render("dashboard.html", context! { title => TITLE, username => username })
}

/// Catch-all for unknown routes
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Error 404")
}
