//! Link lifecycle state machine.
//!
//! Pure decision logic: given an already fetched [`Link`] and the current
//! time, decide whether a visit may proceed and which store mutation has to
//! accompany the answer. Nothing here performs I/O; the service layer applies
//! the returned [`SideEffect`] through the repository.
//!
//! # States
//!
//! ```text
//!            expiry_date passes
//!   Active ───────────────────────▶ Expired
//!     │                                ▲
//!     │ visit_count reaches max_uses   │ owner delete / sweep
//!     ▼                                │
//!   Exhausted ─────────────────────────┘ (retired: is_expired = true)
//! ```
//!
//! A hard-deleted row no longer exists and is reported as not found by the
//! repository, so it never reaches this module.

use chrono::{DateTime, Utc};

use crate::domain::entities::Link;
use crate::utils::url_normalizer::ensure_scheme;

/// Effective state of a link at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Expired,
    Exhausted,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Which terminal reason wins when a link is both past its expiry date and
/// out of uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialPrecedence {
    ExpiryFirst,
    ExhaustionFirst,
}

/// Precedence used by the service unless configured otherwise.
pub const DENIAL_PRECEDENCE: DenialPrecedence = DenialPrecedence::ExpiryFirst;

/// Why a visit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Expired,
    Exhausted,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
        }
    }

    /// HTTP status reported for this denial (410 Gone for both reasons).
    pub fn http_status(&self) -> u16 {
        410
    }
}

/// Outcome reported to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Redirect { url: String },
    Deny { reason: DenyReason },
}

/// Store mutation that must accompany a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    Retire,
    Increment,
}

/// A decision plus the mutation that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub effect: SideEffect,
}

/// Computes the effective state of `link` at `now`.
///
/// A set `is_expired` flag always yields [`LinkState::Expired`]. Otherwise the
/// derived conditions are checked in the order given by `precedence`.
pub fn state_of(link: &Link, now: DateTime<Utc>, precedence: DenialPrecedence) -> LinkState {
    if link.is_expired {
        return LinkState::Expired;
    }

    let past_expiry = link.is_past_expiry(now);
    let exhausted = link.is_exhausted();

    match precedence {
        DenialPrecedence::ExpiryFirst if past_expiry => LinkState::Expired,
        DenialPrecedence::ExpiryFirst if exhausted => LinkState::Exhausted,
        DenialPrecedence::ExhaustionFirst if exhausted => LinkState::Exhausted,
        DenialPrecedence::ExhaustionFirst if past_expiry => LinkState::Expired,
        _ => LinkState::Active,
    }
}

/// Decides the outcome of a single visit.
///
/// 1. Already flagged expired: deny as `expired`, nothing to write.
/// 2. Past its expiry date or out of uses: deny and retire the row.
/// 3. Otherwise: redirect and increment the visit counter.
pub fn evaluate_visit(link: &Link, now: DateTime<Utc>, precedence: DenialPrecedence) -> Verdict {
    if link.is_expired {
        return Verdict {
            decision: Decision::Deny {
                reason: DenyReason::Expired,
            },
            effect: SideEffect::None,
        };
    }

    match state_of(link, now, precedence) {
        LinkState::Active => Verdict {
            decision: Decision::Redirect {
                url: ensure_scheme(&link.original_url),
            },
            effect: SideEffect::Increment,
        },
        LinkState::Expired => Verdict {
            decision: Decision::Deny {
                reason: DenyReason::Expired,
            },
            effect: SideEffect::Retire,
        },
        LinkState::Exhausted => Verdict {
            decision: Decision::Deny {
                reason: DenyReason::Exhausted,
            },
            effect: SideEffect::Retire,
        },
    }
}
