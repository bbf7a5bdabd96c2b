//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink, Owner};
use crate::domain::repositories::{LinkRepository, RepositoryError};

/// Unique constraint guarding the short-code namespace.
const SHORT_CODE_CONSTRAINT: &str = "links_short_code_key";

const LINK_COLUMNS: &str = "id, short_code, original_url, owner_id, created_at, \
                            expiry_date, max_uses, visit_count, is_expired";

#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: i64,
    short_code: String,
    original_url: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    expiry_date: DateTime<Utc>,
    max_uses: Option<i64>,
    visit_count: i64,
    is_expired: bool,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.id,
            short_code: row.short_code,
            original_url: row.original_url,
            owner: Owner::from_column(row.owner_id),
            created_at: row.created_at,
            expiry_date: row.expiry_date,
            max_uses: row.max_uses,
            visit_count: row.visit_count,
            is_expired: row.is_expired,
        }
    }
}

/// PostgreSQL repository for links.
///
/// Uniqueness is enforced by the `links_short_code_key` constraint and the
/// visit counter is only ever touched by a single conditional `UPDATE`, so
/// concurrent redirects on one code can never push it past `max_uses`.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn is_short_code_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(SHORT_CODE_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn try_insert_unique(&self, new_link: NewLink) -> Result<Link, RepositoryError> {
        let sql = format!(
            "INSERT INTO links (short_code, original_url, owner_id, created_at, expiry_date, max_uses)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.short_code)
            .bind(&new_link.original_url)
            .bind(new_link.owner.as_column())
            .bind(new_link.created_at)
            .bind(new_link.expiry_date)
            .bind(new_link.max_uses)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_short_code_conflict(&e) {
                    RepositoryError::Collision
                } else {
                    RepositoryError::Storage(e)
                }
            })?;

        Ok(row.into())
    }

    async fn fetch_by_short_code(&self, code: &str) -> Result<Link, RepositoryError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE short_code = $1");

        sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Link::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Link, RepositoryError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Link::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Link>, RepositoryError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn atomic_increment_visit(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, RepositoryError> {
        // Concurrent updates on the row re-check the guard after the lock is
        // released, so the cap holds without an explicit transaction.
        let (found, visit_count) = sqlx::query_as::<_, (bool, Option<i64>)>(
            r#"
            WITH bumped AS (
                UPDATE links
                SET visit_count = visit_count + 1
                WHERE short_code = $1
                  AND NOT is_expired
                  AND expiry_date >= $2
                  AND (max_uses IS NULL OR visit_count < max_uses)
                RETURNING visit_count
            )
            SELECT
                EXISTS (SELECT 1 FROM links WHERE short_code = $1) AS found,
                (SELECT visit_count FROM bumped) AS visit_count
            "#,
        )
        .bind(code)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        if !found {
            return Err(RepositoryError::NotFound);
        }

        Ok(visit_count)
    }

    async fn retire(&self, code: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE links SET is_expired = TRUE WHERE short_code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_original_url(
        &self,
        code: &str,
        new_url: &str,
    ) -> Result<Link, RepositoryError> {
        let sql = format!(
            "UPDATE links SET original_url = $2 WHERE short_code = $1 RETURNING {LINK_COLUMNS}"
        );

        sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .bind(new_url)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Link::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, code: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM links WHERE short_code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn retire_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE links SET is_expired = TRUE WHERE NOT is_expired AND expiry_date < $1",
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
