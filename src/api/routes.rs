//! Register, login and logout handlers

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::auth::{AuthService, Credentials, SessionService, SessionUser};
use crate::error::Result;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Create an account and log straight into it
pub async fn register(
    State(auth): State<AuthService>,
    State(sessions): State<SessionService>,
    headers: HeaderMap,
    credentials: Credentials,
) -> Result<Response> {
    if let Err(e) = credentials.validate() {
        tracing::warn!("Rejected registration payload: {}", e);
        return Ok(Redirect::to("/").into_response());
    }

    if !auth
        .register(&credentials.username, &credentials.password)
        .await?
    {
        return Ok(Redirect::to("/").into_response());
    }

    start_session(&sessions, credentials.username, &headers).await
}

pub async fn login(
    State(auth): State<AuthService>,
    State(sessions): State<SessionService>,
    headers: HeaderMap,
    credentials: Credentials,
) -> Result<Response> {
    if let Err(e) = credentials.validate() {
        tracing::warn!("Rejected login payload: {}", e);
        return Ok(Redirect::to("/").into_response());
    }

    if !auth.login(&credentials.username, &credentials.password).await? {
        return Ok(Redirect::to("/").into_response());
    }

    tracing::info!("Logged in: {}", credentials.username);
    start_session(&sessions, credentials.username, &headers).await
}

/// Final step of `/logout`, after the session is gone
pub async fn logged_out() -> Redirect {
    Redirect::to("/")
}

async fn start_session(
    sessions: &SessionService,
    username: String,
    headers: &HeaderMap,
) -> Result<Response> {
    let cookie = sessions
        .establish(SessionUser::new(username), headers)
        .await?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response())
}
