//! Handler for per-link visit statistics.

use axum::{
    Extension,
    extract::{Path, State},
};

use crate::api::dto::envelope::ApiResponse;
use crate::api::dto::stats::StatsResponse;
use crate::api::middleware::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the visit counter and lifecycle state of a link.
///
/// # Endpoint
///
/// `GET /api/links/{code}/stats`
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Statistics retrieved",
///   "data": { "visits": 3, "maxUses": 10, "isExpired": false, "status": "active" }
/// }
/// ```
///
/// `isExpired` reflects the effective state: a link past its expiry date is
/// reported expired even before the stored flag is synchronised.
///
/// # Errors
///
/// Returns 403 Forbidden if the caller does not own the link.
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<ApiResponse<StatsResponse>, AppError> {
    let stats = state.link_service.stats(&code, &user_id).await?;

    Ok(ApiResponse::success("Statistics retrieved", stats.into()))
}
