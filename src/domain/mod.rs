//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`lifecycle`] - Visit decision state machine (pure, no I/O)
//! - [`expiry_sweeper`] - Background task synchronising the cached expiry flag
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Orchestration lives in services (see [`crate::application::services`])
//!
//! # Redirect Flow
//!
//! 1. HTTP handler asks [`crate::application::services::LinkService::redirect`]
//! 2. The service fetches the link through [`repositories::LinkRepository`]
//! 3. [`lifecycle::evaluate_visit`] decides redirect vs. deny and the side effect
//! 4. The service applies the side effect (conditional increment or retire)

pub mod entities;
pub mod expiry_sweeper;
pub mod lifecycle;
pub mod repositories;
