//! Utility functions for code generation and URL processing.
//!
//! - [`code_generator`] - Short code generation
//! - [`url_normalizer`] - URL validation and scheme injection

pub mod code_generator;
pub mod url_normalizer;
