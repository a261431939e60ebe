//! HTTP server

use axum::{
    extract::FromRef,
    handler::HandlerWithoutStateExt,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{enforce_guards, logout, AuthService, Guard, GuardState, SessionService};
use crate::config::Config;
use crate::error::Result;
use crate::store::{self, CredentialStore};
use crate::ui::{self, Pages};

use super::routes;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub sessions: SessionService,
    pub pages: Pages,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self {
            auth: AuthService::new(store, config.auth.bcrypt_cost),
            sessions: SessionService::from_config(&config)?,
            pages: Pages::new(),
            config: Arc::new(config),
        })
    }
}

/// Run the HTTP server with the configured credential store
pub async fn run_server(config: Config) -> Result<()> {
    config.validate()?;

    let store = store::from_config(&config.database);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store)?;

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    serve(listener, state).await
}

/// Serve on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let cleanup = state
        .sessions
        .manager()
        .spawn_cleanup(SESSION_CLEANUP_INTERVAL);

    let app = create_router(state);
    let result = axum::serve(listener, app).await;

    cleanup.abort();
    result?;
    Ok(())
}

fn guarded(state: &AppState, guard: Guard) -> GuardState {
    GuardState::new(state.sessions.clone(), [guard])
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let anonymous_only = guarded(&state, Guard::require_not_authenticated("/dashboard"));
    let authenticated_only = guarded(&state, Guard::require_authenticated("/"));

    let router = Router::new()
        .route(
            "/",
            get(ui::home).route_layer(from_fn_with_state(anonymous_only.clone(), enforce_guards)),
        )
        .route(
            "/dashboard",
            get(ui::dashboard)
                .route_layer(from_fn_with_state(authenticated_only.clone(), enforce_guards)),
        )
        .route(
            "/register",
            post(routes::register)
                .route_layer(from_fn_with_state(anonymous_only.clone(), enforce_guards)),
        )
        .route(
            "/login",
            post(routes::login).route_layer(from_fn_with_state(anonymous_only, enforce_guards)),
        )
        // Guard runs first, then logout, then the redirect
        .route(
            "/logout",
            get(routes::logged_out)
                .route_layer(from_fn_with_state(state.sessions.clone(), logout))
                .route_layer(from_fn_with_state(authenticated_only, enforce_guards)),
        )
        .route("/health", get(routes::health))
        .method_not_allowed_fallback(ui::not_found);

    let static_dir = &state.config.server.static_dir;
    let router = if static_dir.is_dir() {
        tracing::debug!("Serving static files from {}", static_dir.display());
        router.fallback_service(
            ServeDir::new(static_dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(ui::not_found.into_service()),
        )
    } else {
        router.fallback(ui::not_found)
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
