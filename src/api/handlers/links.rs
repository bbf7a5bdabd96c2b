//! Handlers for link management endpoints.

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::envelope::ApiResponse;
use crate::api::dto::link::{CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::api::middleware::auth::AuthUser;
use crate::domain::entities::{Link, Owner};
use crate::error::AppError;
use crate::state::AppState;

fn render(state: &AppState, link: Link) -> LinkResponse {
    let short_url = state.link_service.short_url(&link.short_code);
    LinkResponse::from_link(link, short_url, state.link_service.anonymous_owner_id())
}

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "example.com/some/long/path",
///   "maxUses": 10,
///   "expiryDate": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// Authentication is optional: without a valid bearer token the link is
/// anonymous and can never be listed or modified.
///
/// # Errors
///
/// Returns 400 Bad Request for a malformed body or URL.
/// Returns 503 Service Unavailable if no free short code could be allocated.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let created = state
        .link_service
        .create(
            &payload.original_url,
            owner,
            payload.max_uses,
            payload.expiry_date,
        )
        .await?;

    let body = LinkResponse::from_link(
        created.link,
        created.short_url,
        state.link_service.anonymous_owner_id(),
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Short URL created successfully", body),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.list_for_owner(&user_id).await?;

    let items: Vec<LinkResponse> = links.into_iter().map(|l| render(&state, l)).collect();
    let message = format!("Found {} link(s)", items.len());

    Ok(ApiResponse::success(message, items))
}

/// `GET /api/links/{code}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<ApiResponse<LinkResponse>, AppError> {
    let link = state.link_service.get_for_owner(&code, &user_id).await?;

    Ok(ApiResponse::success("Link retrieved", render(&state, link)))
}

/// `GET /api/links/by-id/{id}`
pub async fn get_link_by_id_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<ApiResponse<LinkResponse>, AppError> {
    let Path(id) = id.map_err(|e| {
        AppError::bad_request("Invalid link id", json!({ "reason": e.body_text() }))
    })?;

    let link = state.link_service.get_by_id_for_owner(id, &user_id).await?;

    Ok(ApiResponse::success("Link retrieved", render(&state, link)))
}

/// Replaces the destination of a link.
///
/// # Endpoint
///
/// `PUT /api/links/{code}`
///
/// # Request Body
///
/// ```json
/// { "newUrl": "https://example.org" }
/// ```
///
/// # Errors
///
/// Returns 400 for an invalid URL, 403 if the caller does not own the link,
/// 404 if the code is unknown.
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(code): Path<String>,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Result<ApiResponse<LinkResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .update(&code, &user_id, &payload.new_url)
        .await?;

    Ok(ApiResponse::success(
        "Link updated successfully",
        render(&state, link),
    ))
}

/// Retires a link. Its short code is never handed out again.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.link_service.delete(&code, &user_id).await?;

    Ok(ApiResponse::message("Link deleted successfully"))
}
