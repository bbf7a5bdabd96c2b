//! Rate limiting middleware using token bucket algorithm.
//!
//! Both limiters are generic over the key extractor so the same quotas apply
//! whether the client IP comes from the socket peer address
//! ([`tower_governor::key_extractor::PeerIpKeyExtractor`]) or from forwarding
//! headers behind a trusted proxy
//! ([`tower_governor::key_extractor::SmartIpKeyExtractor`]).

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor};

type Limiter<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates a rate limiter for redirects and link management.
///
/// # Limits
///
/// - **Rate**: one request replenished every 2 seconds
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer<K>(key_extractor: K) -> Limiter<K>
where
    K: KeyExtractor,
{
    build(key_extractor, 2, 100)
}

/// Creates the stricter limiter guarding link creation.
///
/// # Limits
///
/// - **Rate**: one request replenished every 12 seconds (5 per minute)
/// - **Burst**: 5 requests
pub fn create_layer<K>(key_extractor: K) -> Limiter<K>
where
    K: KeyExtractor,
{
    build(key_extractor, 12, 5)
}

fn build<K>(key_extractor: K, replenish_secs: u64, burst: u32) -> Limiter<K>
where
    K: KeyExtractor,
{
    let mut builder = GovernorConfigBuilder::default().key_extractor(key_extractor);
    builder.per_second(replenish_secs).burst_size(burst);

    let governor_conf = Arc::new(builder.finish().expect("rate limit quota must be non-zero"));

    GovernorLayer::new(governor_conf)
}
