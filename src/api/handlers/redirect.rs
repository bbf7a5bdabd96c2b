//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::code_generator::is_well_formed;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Reject codes outside the generator alphabet without touching the store
/// 2. Fetch the link and evaluate the visit against its lifecycle state
/// 3. Active: count the visit atomically and answer `303 See Other`
/// 4. Expired or out of uses: retire the link and answer `410 Gone`
///
/// The visit is counted before the redirect is sent, and the store write
/// completes even if the client disconnects while it is in flight.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
/// Returns 410 Gone if the link expired or reached its usage limit.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    if !is_well_formed(&code) {
        return Err(AppError::not_found("Short URL not found", Value::Null));
    }

    let target = state.link_service.redirect(&code).await?;

    Ok(Redirect::to(&target))
}
