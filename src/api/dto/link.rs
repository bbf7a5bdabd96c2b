//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::Link;
use crate::domain::lifecycle::{DENIAL_PRECEDENCE, state_of};

/// Upper bound on accepted destination length.
pub const MAX_URL_LENGTH: u64 = 2048;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    /// Destination; `https://` is prepended when no scheme is given.
    #[validate(length(min = 1, max = "MAX_URL_LENGTH", message = "Original URL is required."))]
    pub original_url: String,

    /// Number of redirects allowed before the link is retired. Unlimited when absent.
    #[validate(range(min = 1, message = "maxUses must be a positive integer"))]
    pub max_uses: Option<i64>,

    /// Expiry timestamp (RFC 3339). Defaults to now + the configured window.
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Request body for `PUT /api/links/{code}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    #[validate(length(min = 1, max = "MAX_URL_LENGTH", message = "New URL is required."))]
    pub new_url: String,
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    #[serde(rename = "shortURL")]
    pub short_url: String,
    pub original_url: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub max_uses: Option<i64>,
    pub visit_count: i64,
    pub is_expired: bool,
    pub status: &'static str,
}

impl LinkResponse {
    /// Renders `link`; anonymous owners are shown as `anonymous_owner_id`.
    pub fn from_link(link: Link, short_url: String, anonymous_owner_id: &str) -> Self {
        let status = state_of(&link, Utc::now(), DENIAL_PRECEDENCE).as_str();
        let owner_id = link.owner.display_id(anonymous_owner_id).to_string();

        Self {
            id: link.id,
            short_code: link.short_code,
            short_url,
            original_url: link.original_url,
            owner_id,
            created_at: link.created_at,
            expiry_date: link.expiry_date,
            max_uses: link.max_uses,
            visit_count: link.visit_count,
            is_expired: link.is_expired,
            status,
        }
    }
}
