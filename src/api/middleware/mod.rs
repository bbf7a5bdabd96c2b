//! Request middleware.
//!
//! [`auth`] resolves bearer tokens to owners; [`rate_limit`] and [`tracing`]
//! wrap whole route groups.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
