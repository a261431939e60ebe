//! Session resolution and route guards
//!
//! Each request resolves its own [`SessionContext`] from the session cookie.
//! Guards are plain predicates over that context, checked in order by
//! [`enforce_guards`]; the first one that fails ends the request with a
//! redirect.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::auth::cookie::CookieSettings;
use crate::auth::models::SessionUser;
use crate::auth::session::{Session, SessionManager};
use crate::auth::token::SessionSigner;
use crate::config::Config;
use crate::error::{Error, Result};

/// Session store, cookie signing and cookie encoding together
#[derive(Clone)]
pub struct SessionService {
    manager: SessionManager,
    signer: SessionSigner,
    cookies: CookieSettings,
}

impl SessionService {
    pub fn new(manager: SessionManager, signer: SessionSigner, cookies: CookieSettings) -> Self {
        Self {
            manager,
            signer,
            cookies,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            SessionManager::from_config(config)?,
            SessionSigner::new(&config.session.secret),
            CookieSettings::from_config(&config.session),
        ))
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Look up the session named by the request's cookie
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<SessionContext> {
        let Some(token) = self.cookies.read(headers) else {
            return Ok(SessionContext::anonymous());
        };

        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Ignoring invalid session cookie: {}", e);
                return Ok(SessionContext::anonymous());
            }
        };

        Ok(SessionContext {
            session: self.manager.get_session(&claims.sid).await?,
        })
    }

    /// Start an authenticated session, returning the `Set-Cookie` value for it
    pub async fn establish(&self, user: SessionUser, request: &HeaderMap) -> Result<HeaderValue> {
        let session = self.manager.create_session(user).await?;
        let max_age = (session.expires_at - session.created_at).num_seconds();

        let cookie = self
            .signer
            .sign(&session.id, session.expires_at)
            .and_then(|token| self.cookies.issue(&token, max_age, request));

        if cookie.is_err() {
            self.manager.destroy_session(&session.id).await?;
        }
        cookie
    }

    /// Destroy the session behind `ctx`, if any
    pub async fn destroy(&self, ctx: &SessionContext) -> Result<bool> {
        match &ctx.session {
            Some(session) => self.manager.destroy_session(&session.id).await,
            None => Ok(false),
        }
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self, request: &HeaderMap) -> Result<HeaderValue> {
        self.cookies.clear(request)
    }
}

/// Per-request view of the caller's session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session: Option<Session>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.session.as_ref().map(|session| &session.user)
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    SessionService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        // Guards already resolved it for this request
        if let Some(ctx) = parts.extensions.get::<SessionContext>() {
            return Ok(ctx.clone());
        }
        let sessions = SessionService::from_ref(state);
        sessions.resolve(&parts.headers).await
    }
}

/// A route gate on the session's authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Continue only with an authenticated session
    RequireAuthenticated { failure_redirect: String },
    /// Continue only without an authenticated session
    RequireNotAuthenticated { failure_redirect: String },
}

impl Guard {
    pub fn require_authenticated(failure_redirect: impl Into<String>) -> Self {
        Guard::RequireAuthenticated {
            failure_redirect: failure_redirect.into(),
        }
    }

    pub fn require_not_authenticated(failure_redirect: impl Into<String>) -> Self {
        Guard::RequireNotAuthenticated {
            failure_redirect: failure_redirect.into(),
        }
    }

    /// `Ok` to continue, or the redirect to answer with
    pub fn check(&self, ctx: &SessionContext) -> std::result::Result<(), Redirect> {
        let (allowed, failure_redirect) = match self {
            Guard::RequireAuthenticated { failure_redirect } => {
                (ctx.is_authenticated(), failure_redirect)
            }
            Guard::RequireNotAuthenticated { failure_redirect } => {
                (!ctx.is_authenticated(), failure_redirect)
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(Redirect::to(failure_redirect))
        }
    }
}

/// State for [`enforce_guards`]: the guards to check, in order
#[derive(Clone)]
pub struct GuardState {
    sessions: SessionService,
    guards: Arc<[Guard]>,
}

impl GuardState {
    pub fn new(sessions: SessionService, guards: impl IntoIterator<Item = Guard>) -> Self {
        Self {
            sessions,
            guards: guards.into_iter().collect(),
        }
    }
}

/// Middleware running each guard in order before the handler
pub async fn enforce_guards(
    State(state): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = match state.sessions.resolve(req.headers()).await {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    for guard in state.guards.iter() {
        if let Err(redirect) = guard.check(&ctx) {
            tracing::debug!("{} {} stopped by {:?}", req.method(), req.uri(), guard);
            return redirect.into_response();
        }
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Middleware destroying the caller's session before continuing
pub async fn logout(
    State(sessions): State<SessionService>,
    ctx: SessionContext,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let clear = sessions.clear_cookie(req.headers())?;

    if sessions.destroy(&ctx).await? {
        if let Some(user) = ctx.user() {
            tracing::info!("Logged out: {}", user.username);
        }
    }

    req.extensions_mut().insert(SessionContext::anonymous());
    let mut response = next.run(req).await;
    response.headers_mut().append(SET_COOKIE, clear);
    Ok(response)
}
