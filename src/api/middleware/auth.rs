//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use tracing::warn;

use crate::domain::entities::Owner;
use crate::{error::AppError, state::AppState};

/// Identity of an authenticated caller, inserted by [`layer`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Requires a valid bearer token.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <jwt>
/// ```
///
/// On success the token subject is stored as an [`AuthUser`] request
/// extension.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing or malformed, the
/// token does not verify, or its subject is the anonymous sentinel.
/// The response carries `WWW-Authenticate: Bearer` per RFC 6750.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let user_id = st.auth_service.require_user(&token)?;
    parts.extensions.insert(AuthUser(user_id));

    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}

/// Resolves the caller to an [`Owner`] without ever rejecting the request.
///
/// A missing header yields [`Owner::Anonymous`]. A header that is present but
/// malformed or unverifiable also yields an anonymous owner and is logged.
pub async fn optional_layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let owner = resolve_owner(&st, &mut parts).await;
    parts.extensions.insert(owner);

    next.run(Request::from_parts(parts, body)).await
}

async fn resolve_owner(st: &AppState, parts: &mut Parts) -> Owner {
    if !parts.headers.contains_key(AUTHORIZATION) {
        return Owner::Anonymous;
    }

    let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(parts, &()).await else {
        warn!("Malformed Authorization header, treating caller as anonymous");
        return Owner::Anonymous;
    };

    match st.auth_service.verify(&token) {
        Ok(owner) => owner,
        Err(e) => {
            warn!(error = %e, details = %e.details(), "Invalid bearer token, treating caller as anonymous");
            Owner::Anonymous
        }
    }
}
