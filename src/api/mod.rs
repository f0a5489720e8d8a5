//! HTTP surface: handlers, authentication, wire models, and the router.

pub mod auth;
pub mod handlers;
pub mod models;

pub use handlers::AppState;
pub use models::{ModelInfo, ModelList};

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::core::middleware::cors_middleware;

/// Build the full application router.
///
/// `/v1/models` lists the catalog; every other `/v1/...` path forwards to
/// the resolved upstream; anything else redirects. The CORS middleware
/// wraps everything so preflight requests short-circuit before routing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/models", get(handlers::list_models))
        .route("/v1/*path", any(handlers::forward_request))
        .fallback(handlers::redirect_fallback)
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
