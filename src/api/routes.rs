//! API route configuration.
//!
//! Link creation accepts anonymous callers; every other endpoint requires a
//! bearer token verified by [`crate::api::middleware::auth::layer`].

use crate::api::handlers::{
    create_link_handler, delete_link_handler, get_link_by_id_handler, get_link_handler,
    list_links_handler, stats_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// `POST /links` - create a short link (optional authentication).
pub fn create_routes() -> Router<AppState> {
    Router::new().route("/links", post(create_link_handler))
}

/// Owner-scoped routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /links`              - List the caller's links
/// - `GET    /links/{code}`       - Read one link
/// - `PUT    /links/{code}`       - Replace the destination URL
/// - `DELETE /links/{code}`       - Retire the link
/// - `GET    /links/{code}/stats` - Visit statistics
/// - `GET    /links/by-id/{id}`   - Read one link by numeric id
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler))
        .route(
            "/links/{code}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/{code}/stats", get(stats_handler))
        .route("/links/by-id/{id}", get(get_link_by_id_handler))
}
