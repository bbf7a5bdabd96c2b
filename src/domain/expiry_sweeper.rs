//! Periodic synchronisation of the cached `is_expired` flag.
//!
//! Redirects retire stale links lazily, but links nobody visits would keep
//! `is_expired = false` forever. The sweeper flips the flag in bulk so listings
//! and statistics agree with the derived state.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

use crate::domain::repositories::{LinkRepository, RepositoryError};

/// Attempts per sweep before the failure is logged and the tick is skipped.
const SWEEP_ATTEMPTS: usize = 3;

/// Runs a single sweep, retrying transient store failures with backoff.
///
/// # Errors
///
/// Returns the last [`RepositoryError`] once all attempts are used up.
pub async fn sweep_once(repository: &Arc<dyn LinkRepository>) -> Result<u64, RepositoryError> {
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(2))
        .map(jitter)
        .take(SWEEP_ATTEMPTS - 1);

    Retry::start(strategy, || async {
        repository.retire_expired(Utc::now()).await
    })
    .await
}

/// Sweeps expired links every `period` until the task is dropped.
pub async fn run_expiry_sweeper(repository: Arc<dyn LinkRepository>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match sweep_once(&repository).await {
            Ok(0) => debug!("Expiry sweep: nothing to retire"),
            Ok(retired) => info!(retired, "Expiry sweep retired links"),
            Err(e) => error!(error = %e, "Expiry sweep failed"),
        }
    }
}
