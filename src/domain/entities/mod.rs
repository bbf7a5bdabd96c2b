//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL with its expiry, use cap and visit counter
//! - [`Owner`] - Who created a link: an authenticated principal or nobody
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! [`NewLink`] carries everything the store needs to insert a row, [`Link`] is
//! what comes back.

pub mod link;
pub mod owner;

pub use link::{Link, NewLink};
pub use owner::Owner;
