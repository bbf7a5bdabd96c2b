//! DTOs for link statistics.

use serde::Serialize;

use crate::application::services::link_service::LinkStats;

/// Visit statistics for a single short link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub visits: i64,
    pub max_uses: Option<i64>,
    /// Effective flag: true when retired or past the expiry date.
    pub is_expired: bool,
    pub status: &'static str,
}

impl From<LinkStats> for StatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            visits: stats.visit_count,
            max_uses: stats.max_uses,
            is_expired: stats.is_expired,
            status: stats.state.as_str(),
        }
    }
}
