//! Link creation, redirect, and ownership-gated management.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::entities::{Link, NewLink, Owner};
use crate::domain::lifecycle::{
    DENIAL_PRECEDENCE, Decision, DenialPrecedence, DenyReason, LinkState, SideEffect,
    evaluate_visit, state_of,
};
use crate::domain::repositories::{LinkRepository, RepositoryError};
use crate::error::AppError;
use crate::utils::code_generator::generate;
use crate::utils::url_normalizer::normalize_url;

/// How many times a refused increment is re-evaluated against a fresh row.
const REFETCH_LIMIT: usize = 1;

/// Tunables consumed by [`LinkService`].
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub code_length: usize,
    pub expiry_days: i64,
    pub max_code_attempts: usize,
    pub store_timeout: Duration,
    pub base_url: String,
    pub anonymous_owner_id: String,
    pub precedence: DenialPrecedence,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            expiry_days: 30,
            max_code_attempts: 10,
            store_timeout: Duration::from_secs(5),
            base_url: "http://localhost:3000".to_string(),
            anonymous_owner_id: "00000000-0000-0000-0000-000000000000".to_string(),
            precedence: DENIAL_PRECEDENCE,
        }
    }
}

/// A freshly persisted link together with its public URL.
#[derive(Debug, Clone)]
pub struct CreatedLink {
    pub link: Link,
    pub short_url: String,
}

/// Owner-visible counters of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStats {
    pub visit_count: i64,
    pub max_uses: Option<i64>,
    /// Effective value: the stored flag or the derived expiry/exhaustion.
    pub is_expired: bool,
    pub state: LinkState,
}

/// Orchestrates code generation, persistence and the lifecycle engine.
///
/// Every store call runs under `store_timeout`. Mutations are dispatched on
/// their own task and awaited through the join handle, so a client that
/// disconnects mid-request cannot cancel a write that is already in flight.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(repository: Arc<dyn LinkRepository>, settings: LinkSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Identifier rendered for links without an authenticated owner.
    pub fn anonymous_owner_id(&self) -> &str {
        &self.settings.anonymous_owner_id
    }

    /// Fully-qualified public URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), code)
    }

    /// Creates a link with a freshly allocated short code.
    ///
    /// A missing scheme becomes `https://`. Without `expiry_date` the link
    /// expires `expiry_days` after creation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed URL or a non-positive `max_uses`.
    /// Returns [`AppError::AllocationExhausted`] once `max_code_attempts` codes collided.
    /// Returns [`AppError::Internal`] on storage failures or when the default
    /// expiry window overflows the calendar.
    pub async fn create(
        &self,
        original_url: &str,
        owner: Owner,
        max_uses: Option<i64>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Result<CreatedLink, AppError> {
        let original_url = normalize_url(original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(max) = max_uses.filter(|max| *max < 1) {
            return Err(AppError::bad_request(
                "maxUses must be a positive integer",
                json!({ "maxUses": max }),
            ));
        }

        let created_at = Utc::now();
        let expiry_date = match expiry_date {
            Some(expiry_date) => expiry_date,
            None => self.default_expiry(created_at)?,
        };

        for attempt in 1..=self.settings.max_code_attempts {
            let short_code = generate(self.settings.code_length).map_err(|e| {
                AppError::bad_request("Invalid short code length", json!({ "reason": e.to_string() }))
            })?;

            let new_link = NewLink {
                short_code,
                original_url: original_url.clone(),
                owner: owner.clone(),
                created_at,
                expiry_date,
                max_uses,
            };

            let inserted = self
                .dispatch(move |repository| async move {
                    repository.try_insert_unique(new_link).await
                })
                .await?;

            match inserted {
                Ok(link) => {
                    info!(code = %link.short_code, owner = %link.owner, "Link created");
                    let short_url = self.short_url(&link.short_code);
                    return Ok(CreatedLink { link, short_url });
                }
                Err(RepositoryError::Collision) => {
                    warn!(attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::allocation_exhausted(
            "Failed to allocate a unique short code",
            json!({ "attempts": self.settings.max_code_attempts }),
        ))
    }

    /// Resolves a visit to its destination URL, applying the lifecycle side effect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown codes.
    /// Returns [`AppError::Gone`] for expired or exhausted links.
    /// Returns [`AppError::Internal`] on storage failures.
    pub async fn redirect(&self, code: &str) -> Result<String, AppError> {
        let mut link = self.fetch(code).await?;

        for _ in 0..=REFETCH_LIMIT {
            let now = Utc::now();
            let verdict = evaluate_visit(&link, now, self.settings.precedence);

            match (verdict.decision, verdict.effect) {
                (Decision::Deny { reason }, effect) => {
                    if effect == SideEffect::Retire {
                        self.retire_link(code).await?;
                        info!(code, reason = reason.as_str(), "Link retired on visit");
                    }
                    return Err(denied(code, reason));
                }
                (Decision::Redirect { url }, _) => {
                    let owned = code.to_string();
                    let counted = self
                        .dispatch(move |repository| async move {
                            repository.atomic_increment_visit(&owned, now).await
                        })
                        .await??;

                    if let Some(visits) = counted {
                        debug!(code, visits, "Redirecting");
                        return Ok(url);
                    }

                    warn!(code, "Visit increment refused, re-evaluating link");
                    link = self.fetch(code).await?;
                }
            }
        }

        Err(denied(code, DenyReason::Exhausted))
    }

    /// Replaces the destination of a link owned by `requester_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], [`AppError::Forbidden`] for non-owners,
    /// or [`AppError::Validation`] for a malformed URL.
    pub async fn update(
        &self,
        code: &str,
        requester_id: &str,
        new_url: &str,
    ) -> Result<Link, AppError> {
        let link = self.fetch(code).await?;
        ensure_owner(&link, requester_id)?;

        let new_url = normalize_url(new_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let owned = code.to_string();
        let updated = self
            .dispatch(move |repository| async move {
                repository.update_original_url(&owned, &new_url).await
            })
            .await??;

        info!(code, "Link destination updated");
        Ok(updated)
    }

    fn default_expiry(&self, created_at: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        ChronoDuration::try_days(self.settings.expiry_days)
            .and_then(|window| created_at.checked_add_signed(window))
            .ok_or_else(|| {
                AppError::internal(
                    "Default expiry window out of range",
                    json!({ "expiryDays": self.settings.expiry_days }),
                )
            })
    }

    /// Retires a link owned by `requester_id`. The code stays reserved.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`] for non-owners.
    pub async fn delete(&self, code: &str, requester_id: &str) -> Result<(), AppError> {
        let link = self.fetch(code).await?;
        ensure_owner(&link, requester_id)?;

        self.retire_link(code).await?;
        info!(code, "Link deleted by owner");
        Ok(())
    }

    /// Reads the counters of a link owned by `requester_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`] for non-owners.
    pub async fn stats(&self, code: &str, requester_id: &str) -> Result<LinkStats, AppError> {
        let link = self.fetch(code).await?;
        ensure_owner(&link, requester_id)?;

        let state = state_of(&link, Utc::now(), self.settings.precedence);

        Ok(LinkStats {
            visit_count: link.visit_count,
            max_uses: link.max_uses,
            is_expired: state != LinkState::Active,
            state,
        })
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Link>, AppError> {
        Ok(self
            .within_deadline(self.repository.list_by_owner(owner_id))
            .await?)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`] for non-owners.
    pub async fn get_for_owner(&self, code: &str, requester_id: &str) -> Result<Link, AppError> {
        let link = self.fetch(code).await?;
        ensure_owner(&link, requester_id)?;
        Ok(link)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`] for non-owners.
    pub async fn get_by_id_for_owner(&self, id: i64, requester_id: &str) -> Result<Link, AppError> {
        let link = self
            .within_deadline(self.repository.fetch_by_id(id))
            .await?;
        ensure_owner(&link, requester_id)?;
        Ok(link)
    }

    /// Checks that the store answers within the deadline.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        self.within_deadline(self.repository.ping()).await
    }

    async fn fetch(&self, code: &str) -> Result<Link, AppError> {
        Ok(self
            .within_deadline(self.repository.fetch_by_short_code(code))
            .await?)
    }

    async fn retire_link(&self, code: &str) -> Result<(), AppError> {
        let owned = code.to_string();
        self.dispatch(move |repository| async move { repository.retire(&owned).await })
            .await??;
        Ok(())
    }

    async fn within_deadline<T, F>(&self, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .map_err(|_| RepositoryError::Timeout)?
    }

    /// Runs a store mutation on its own task under the store deadline.
    ///
    /// The outer `Result` reports a task that panicked; the inner one is the
    /// repository outcome.
    async fn dispatch<T, F, Fut>(&self, op: F) -> Result<Result<T, RepositoryError>, AppError>
    where
        F: FnOnce(Arc<dyn LinkRepository>) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = self.settings.store_timeout;
        let call = op(Arc::clone(&self.repository));

        tokio::spawn(async move {
            tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| RepositoryError::Timeout)?
        })
        .await
        .map_err(|e| AppError::internal("Store task failed", json!({ "reason": e.to_string() })))
    }
}

fn ensure_owner(link: &Link, requester_id: &str) -> Result<(), AppError> {
    if link.is_owned_by(requester_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You do not have access to this link",
            json!({ "shortCode": link.short_code }),
        ))
    }
}

fn denied(code: &str, reason: DenyReason) -> AppError {
    let message = match reason {
        DenyReason::Expired => "Short URL has expired",
        DenyReason::Exhausted => "Short URL has reached its usage limit",
    };

    AppError::gone(
        message,
        json!({ "reason": reason.as_str(), "shortCode": code }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    fn service(mock_repo: MockLinkRepository) -> LinkService {
        LinkService::new(Arc::new(mock_repo), LinkSettings::default())
    }

    fn create_test_link(code: &str, owner: Owner, max_uses: Option<i64>, visits: i64) -> Link {
        let now = Utc::now();
        Link {
            id: 1,
            short_code: code.to_string(),
            original_url: "https://example.com".to_string(),
            owner,
            created_at: now,
            expiry_date: now + ChronoDuration::days(30),
            max_uses,
            visit_count: visits,
            is_expired: false,
        }
    }

    fn alice() -> Owner {
        Owner::Authenticated("alice".to_string())
    }

    #[tokio::test]
    async fn test_create_applies_default_expiry_and_scheme() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .withf(|new_link| {
                new_link.original_url == "https://example.com/page"
                    && new_link.expiry_date == new_link.created_at + ChronoDuration::days(30)
                    && new_link.short_code.len() == 6
            })
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let created = service(mock_repo)
            .create("example.com/page", Owner::Anonymous, None, None)
            .await
            .unwrap();

        assert_eq!(created.link.original_url, "https://example.com/page");
        assert_eq!(
            created.short_url,
            format!("http://localhost:3000/{}", created.link.short_code)
        );
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_http_scheme() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .withf(|new_link| new_link.original_url == "http://example.com")
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let created = service(mock_repo)
            .create("http://example.com", alice(), Some(3), None)
            .await
            .unwrap();

        assert_eq!(created.link.original_url, "http://example.com");
        assert_eq!(created.link.max_uses, Some(3));
        assert_eq!(created.link.owner, alice());
    }

    #[tokio::test]
    async fn test_create_keeps_caller_expiry() {
        let expiry = Utc::now() + ChronoDuration::hours(2);

        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .withf(move |new_link| new_link.expiry_date == expiry)
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let created = service(mock_repo)
            .create("https://example.com", alice(), None, Some(expiry))
            .await
            .unwrap();

        assert_eq!(created.link.expiry_date, expiry);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_try_insert_unique().times(0);

        let result = service(mock_repo)
            .create("javascript:alert(1)", Owner::Anonymous, None, None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_max_uses() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_try_insert_unique().times(0);

        let result = service(mock_repo)
            .create("https://example.com", Owner::Anonymous, Some(0), None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_retries_collisions_below_cap() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let tried = Arc::new(Mutex::new(Vec::new()));
        let seen = tried.clone();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_try_insert_unique().returning(move |new_link| {
            seen.lock().unwrap().push(new_link.short_code.clone());
            if counter.fetch_add(1, Ordering::SeqCst) < 9 {
                Err(RepositoryError::Collision)
            } else {
                Ok(new_link.into_link(1))
            }
        });

        let created = service(mock_repo)
            .create("https://example.com", Owner::Anonymous, None, None)
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 10);
        let tried = tried.lock().unwrap();
        assert_eq!(tried.last().unwrap(), &created.link.short_code);

        let (collided, _) = tried.split_at(9);
        assert!(!collided.contains(&created.link.short_code));
        let distinct: HashSet<&String> = tried.iter().collect();
        assert_eq!(distinct.len(), tried.len());
    }

    #[tokio::test]
    async fn test_create_never_reuses_a_taken_code() {
        let taken = Arc::new(Mutex::new(HashSet::new()));
        let store = taken.clone();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_try_insert_unique().returning(move |new_link| {
            let mut store = store.lock().unwrap();
            if store.insert(new_link.short_code.clone()) {
                Ok(new_link.into_link(store.len() as i64))
            } else {
                Err(RepositoryError::Collision)
            }
        });

        let service = service(mock_repo);
        let mut codes = HashSet::new();
        for _ in 0..50 {
            let created = service
                .create("https://example.com", Owner::Anonymous, None, None)
                .await
                .unwrap();
            assert!(codes.insert(created.link.short_code));
        }

        assert_eq!(taken.lock().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_create_with_out_of_range_expiry_window() {
        let settings = LinkSettings {
            expiry_days: i64::MAX,
            ..LinkSettings::default()
        };
        let service = LinkService::new(Arc::new(MockLinkRepository::new()), settings);

        let err = service
            .create("https://example.com", Owner::Anonymous, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_create_explicit_expiry_ignores_window() {
        let settings = LinkSettings {
            expiry_days: i64::MAX,
            ..LinkSettings::default()
        };
        let expiry = Utc::now() + ChronoDuration::days(1);

        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));
        let service = LinkService::new(Arc::new(mock_repo), settings);

        let created = service
            .create("https://example.com", Owner::Anonymous, None, Some(expiry))
            .await
            .unwrap();

        assert_eq!(created.link.expiry_date, expiry);
    }

    #[tokio::test]
    async fn test_create_fails_after_cap() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .times(10)
            .returning(|_| Err(RepositoryError::Collision));

        let result = service(mock_repo)
            .create("https://example.com", Owner::Anonymous, None, None)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::AllocationExhausted { .. }));
        assert_eq!(err.status_code().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_create_propagates_storage_failure() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_try_insert_unique()
            .times(1)
            .returning(|_| Err(RepositoryError::Timeout));

        let result = service(mock_repo)
            .create("https://example.com", Owner::Anonymous, None, None)
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_redirect_increments_active_link() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .times(1)
            .returning(|code| Ok(create_test_link(code, Owner::Anonymous, None, 0)));
        mock_repo
            .expect_atomic_increment_visit()
            .withf(|code, _| code == "Ab3dE9")
            .times(1)
            .returning(|_, _| Ok(Some(1)));
        mock_repo.expect_retire().times(0);

        let url = service(mock_repo).redirect("Ab3dE9").await.unwrap();

        assert_eq!(url, "https://example.com");
    }

    #[tokio::test]
    async fn test_redirect_single_use_link() {
        let visits = Arc::new(AtomicI64::new(0));
        let read = visits.clone();
        let write = visits.clone();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_fetch_by_short_code().returning(move |code| {
            Ok(create_test_link(
                code,
                Owner::Anonymous,
                Some(1),
                read.load(Ordering::SeqCst),
            ))
        });
        mock_repo
            .expect_atomic_increment_visit()
            .times(1)
            .returning(move |_, _| Ok(Some(write.fetch_add(1, Ordering::SeqCst) + 1)));
        mock_repo.expect_retire().times(1).returning(|_| Ok(()));

        let service = service(mock_repo);

        assert_eq!(
            service.redirect("Ab3dE9").await.unwrap(),
            "https://example.com"
        );
        assert_eq!(visits.load(Ordering::SeqCst), 1);

        let err = service.redirect("Ab3dE9").await.unwrap_err();
        assert!(matches!(err, AppError::Gone { .. }));
        assert_eq!(err.details()["reason"], "exhausted");
        assert_eq!(visits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_redirect_past_expiry_never_increments() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_fetch_by_short_code().returning(|code| {
            let mut link = create_test_link(code, Owner::Anonymous, None, 0);
            link.expiry_date = Utc::now() - ChronoDuration::minutes(1);
            Ok(link)
        });
        mock_repo.expect_atomic_increment_visit().times(0);
        mock_repo.expect_retire().times(1).returning(|_| Ok(()));

        let err = service(mock_repo).redirect("Ab3dE9").await.unwrap_err();

        assert!(matches!(err, AppError::Gone { .. }));
        assert_eq!(err.details()["reason"], "expired");
    }

    #[tokio::test]
    async fn test_redirect_flagged_link_writes_nothing() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_fetch_by_short_code().returning(|code| {
            let mut link = create_test_link(code, Owner::Anonymous, None, 0);
            link.is_expired = true;
            Ok(link)
        });
        mock_repo.expect_atomic_increment_visit().times(0);
        mock_repo.expect_retire().times(0);

        let err = service(mock_repo).redirect("Ab3dE9").await.unwrap_err();

        assert_eq!(err.details()["reason"], "expired");
    }

    #[tokio::test]
    async fn test_redirect_lost_increment_race_refetches() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_fetch_by_short_code().returning(move |code| {
            let visits = if counter.fetch_add(1, Ordering::SeqCst) == 0 { 0 } else { 1 };
            Ok(create_test_link(code, Owner::Anonymous, Some(1), visits))
        });
        mock_repo
            .expect_atomic_increment_visit()
            .times(1)
            .returning(|_, _| Ok(None));
        mock_repo.expect_retire().times(1).returning(|_| Ok(()));

        let err = service(mock_repo).redirect("Ab3dE9").await.unwrap_err();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(err.details()["reason"], "exhausted");
    }

    #[tokio::test]
    async fn test_redirect_unknown_code() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|_| Err(RepositoryError::NotFound));

        let err = service(mock_repo).redirect("nope00").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_redirect_propagates_increment_failure() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, Owner::Anonymous, None, 0)));
        mock_repo
            .expect_atomic_increment_visit()
            .returning(|_, _| Err(RepositoryError::Timeout));

        let err = service(mock_repo).redirect("Ab3dE9").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_update_by_owner_normalizes_url() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));
        mock_repo
            .expect_update_original_url()
            .withf(|code, url| code == "Ab3dE9" && url == "https://new.example.com")
            .times(1)
            .returning(|code, url| {
                let mut link = create_test_link(code, alice(), None, 0);
                link.original_url = url.to_string();
                Ok(link)
            });

        let link = service(mock_repo)
            .update("Ab3dE9", "alice", "new.example.com")
            .await
            .unwrap();

        assert_eq!(link.original_url, "https://new.example.com");
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));
        mock_repo.expect_update_original_url().times(0);

        let err = service(mock_repo)
            .update("Ab3dE9", "mallory", "https://evil.example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_link_is_not_mutable() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, Owner::Anonymous, None, 0)));
        mock_repo.expect_retire().times(0);

        let sentinel = LinkSettings::default().anonymous_owner_id;
        let err = service(mock_repo)
            .delete("Ab3dE9", &sentinel)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_url() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));
        mock_repo.expect_update_original_url().times(0);

        let err = service(mock_repo)
            .update("Ab3dE9", "alice", "ftp://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_owner_retires() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));
        mock_repo
            .expect_retire()
            .withf(|code| code == "Ab3dE9")
            .times(1)
            .returning(|_| Ok(()));
        mock_repo.expect_delete().times(0);

        assert!(service(mock_repo).delete("Ab3dE9", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));
        mock_repo.expect_retire().times(0);

        let err = service(mock_repo)
            .delete("Ab3dE9", "bob")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_stats_is_idempotent() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .times(2)
            .returning(|code| Ok(create_test_link(code, alice(), Some(10), 4)));

        let service = service(mock_repo);
        let first = service.stats("Ab3dE9", "alice").await.unwrap();
        let second = service.stats("Ab3dE9", "alice").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.visit_count, 4);
        assert_eq!(first.max_uses, Some(10));
        assert!(!first.is_expired);
        assert_eq!(first.state, LinkState::Active);
    }

    #[tokio::test]
    async fn test_stats_reports_effective_expiry() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_fetch_by_short_code().returning(|code| {
            let mut link = create_test_link(code, alice(), None, 2);
            link.expiry_date = Utc::now() - ChronoDuration::days(1);
            Ok(link)
        });

        let stats = service(mock_repo).stats("Ab3dE9", "alice").await.unwrap();

        assert!(stats.is_expired);
        assert_eq!(stats.state, LinkState::Expired);
    }

    #[tokio::test]
    async fn test_stats_by_non_owner_is_forbidden() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_short_code()
            .returning(|code| Ok(create_test_link(code, alice(), None, 0)));

        let err = service(mock_repo)
            .stats("Ab3dE9", "bob")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_get_by_id_checks_owner() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_fetch_by_id()
            .returning(|id| {
                let mut link = create_test_link("Ab3dE9", alice(), None, 0);
                link.id = id;
                Ok(link)
            });

        let service = service(mock_repo);

        assert_eq!(service.get_by_id_for_owner(42, "alice").await.unwrap().id, 42);
        assert!(matches!(
            service.get_by_id_for_owner(42, "bob").await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_for_owner_passes_owner_id() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_list_by_owner()
            .withf(|owner_id| owner_id == "alice")
            .times(1)
            .returning(|_| Ok(vec![create_test_link("Ab3dE9", alice(), None, 0)]));

        let links = service(mock_repo).list_for_owner("alice").await.unwrap();

        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let settings = LinkSettings {
            base_url: "https://sho.rt/".to_string(),
            ..LinkSettings::default()
        };
        let service = LinkService::new(Arc::new(MockLinkRepository::new()), settings);

        assert_eq!(service.short_url("Ab3dE9"), "https://sho.rt/Ab3dE9");
    }
}
