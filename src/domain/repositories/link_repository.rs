//! Repository trait for link persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Link, NewLink};

/// Failures surfaced by a [`LinkRepository`].
///
/// Repositories never swallow errors: transport problems are wrapped in
/// [`RepositoryError::Storage`] and handed to the service layer, which
/// translates them before they reach a client.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("link not found")]
    NotFound,

    #[error("short code is already taken")]
    Collision,

    #[error("store call exceeded its deadline")]
    Timeout,

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Repository interface owning every persistent transition of a [`Link`].
///
/// All operations are safe under concurrent callers targeting the same short
/// code: uniqueness is enforced by the store itself and the visit counter is
/// only ever changed by a single conditional server-side update.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts the link iff no existing row shares its short code.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Collision`] if the short code is taken.
    async fn try_insert_unique(&self, new_link: NewLink) -> Result<Link, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this short code.
    async fn fetch_by_short_code(&self, code: &str) -> Result<Link, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this id.
    async fn fetch_by_id(&self, id: i64) -> Result<Link, RepositoryError>;

    /// Lists every link created by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Link>, RepositoryError>;

    /// Increments the visit counter iff the link is still live at `now`.
    ///
    /// The check and the increment are one atomic operation: the row must not
    /// be flagged expired, `expiry_date` must not lie before `now`, and when a
    /// use cap is set the counter must still be below it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(count))` with the post-increment counter
    /// - `Ok(None)` if the row exists but is no longer eligible
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this short code.
    async fn atomic_increment_visit(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, RepositoryError>;

    /// Sets `is_expired = true`. Retiring an already retired link succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this short code.
    async fn retire(&self, code: &str) -> Result<(), RepositoryError>;

    /// Replaces the destination URL and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this short code.
    async fn update_original_url(&self, code: &str, new_url: &str)
    -> Result<Link, RepositoryError>;

    /// Removes the row. The short code becomes available for reissue.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this short code.
    async fn delete(&self, code: &str) -> Result<(), RepositoryError>;

    /// Flags every live row whose `expiry_date` lies before `now`.
    ///
    /// Returns the number of rows retired.
    async fn retire_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;

    /// Cheap round-trip used by health checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
