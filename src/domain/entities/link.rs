//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

use super::owner::Owner;

/// A shortened URL with its lifecycle metadata.
///
/// `is_expired` is a cached flag: a link whose `expiry_date` has passed is
/// logically expired even while the flag is still `false`. Use
/// [`crate::domain::lifecycle::state_of`] to get the effective state.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub max_uses: Option<i64>,
    pub visit_count: i64,
    pub is_expired: bool,
}

impl Link {
    /// Returns true if `expiry_date` lies strictly before `now`.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }

    /// Returns true if a use cap is set and the counter has reached it.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.visit_count >= max)
    }

    /// Returns true if `requester_id` owns this link.
    pub fn is_owned_by(&self, requester_id: &str) -> bool {
        self.owner.is(requester_id)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub max_uses: Option<i64>,
}

impl NewLink {
    /// Materialises the row the store would return right after insertion.
    pub fn into_link(self, id: i64) -> Link {
        Link {
            id,
            short_code: self.short_code,
            original_url: self.original_url,
            owner: self.owner,
            created_at: self.created_at,
            expiry_date: self.expiry_date,
            max_uses: self.max_uses,
            visit_count: 0,
            is_expired: false,
        }
    }
}
