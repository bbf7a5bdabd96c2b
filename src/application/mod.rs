//! Application layer services implementing business logic.
//!
//! Services consume the [`crate::domain::repositories::LinkRepository`] trait
//! and translate every lower-layer failure into [`crate::error::AppError`]
//! before it reaches a handler.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, redirects and owner management
//! - [`services::auth_service::AuthService`] - Bearer token verification

pub mod services;
