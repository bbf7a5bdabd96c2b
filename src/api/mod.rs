//! HTTP surface of the service.
//!
//! Handlers turn requests into [`crate::application::services::LinkService`]
//! calls and render the results in the JSON envelope.
//!
//! # Modules
//!
//! - [`dto`] - Request bodies, response shapes and the envelope
//! - [`handlers`] - Endpoint handlers
//! - [`middleware`] - Bearer auth, rate limiting and request tracing
//! - [`routes`] - `/api` route groups

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
