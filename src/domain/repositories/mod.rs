//! Repository trait definitions for the domain layer.
//!
//! The [`LinkRepository`] trait abstracts every persistent state transition of
//! a link. Implementations live in `crate::infrastructure::persistence`; a
//! mock is generated via `mockall` for unit tests.
//!
//! # Testing
//!
//! See integration tests in `tests/repository_link.rs` for usage examples.

pub mod link_repository;

pub use link_repository::{LinkRepository, RepositoryError};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
