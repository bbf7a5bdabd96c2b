//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`   - Short link redirect (public)
//! - `GET  /health`   - Storage health check (public)
//! - `POST /api/links` - Link creation (optional Bearer token)
//! - `/api/links/*`   - Owner-scoped management (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket, keyed on the peer address or on
//!   forwarding headers when running behind a proxy
//! - **Authentication** - Bearer JWT
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// How the rate limiter identifies clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Disabled,
    /// Key on the socket peer address.
    PeerIp,
    /// Key on `X-Forwarded-For` / `X-Real-IP`; only behind a trusted proxy.
    Forwarded,
}

impl RateLimiting {
    pub fn from_flags(enabled: bool, behind_proxy: bool) -> Self {
        match (enabled, behind_proxy) {
            (false, _) => Self::Disabled,
            (true, false) => Self::PeerIp,
            (true, true) => Self::Forwarded,
        }
    }
}

/// Constructs the application router with path normalization applied.
///
/// Rate limiting needs the peer address, so a router built with anything
/// but [`RateLimiting::Disabled`] must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState, rate_limiting: RateLimiting) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, rate_limiting))
}

/// Constructs the application router with all routes and middleware.
pub fn router(state: AppState, rate_limiting: RateLimiting) -> Router {
    let create = api::routes::create_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::optional_layer,
    ));

    let owner = api::routes::owner_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let redirect = Router::new().route("/{code}", get(redirect_handler));

    let (create, owner, redirect) = match rate_limiting {
        RateLimiting::Disabled => (create, owner, redirect),
        RateLimiting::PeerIp => (
            create.layer(rate_limit::create_layer(PeerIpKeyExtractor)),
            owner.layer(rate_limit::layer(PeerIpKeyExtractor)),
            redirect.layer(rate_limit::layer(PeerIpKeyExtractor)),
        ),
        RateLimiting::Forwarded => (
            create.layer(rate_limit::create_layer(SmartIpKeyExtractor)),
            owner.layer(rate_limit::layer(SmartIpKeyExtractor)),
            redirect.layer(rate_limit::layer(SmartIpKeyExtractor)),
        ),
    };

    Router::new()
        .route("/health", get(health_handler))
        .merge(redirect)
        .nest("/api", create.merge(owner))
        .with_state(state)
        .layer(tracing::layer())
}
