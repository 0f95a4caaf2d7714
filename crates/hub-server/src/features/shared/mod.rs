//! Shared utilities and types for feature modules
//!
//! # Contents
//!
//! - **validation**: Input validation utilities
//! - **error_helpers**: Database error handling utilities
//! - **test_helpers**: Test fixtures and utilities (test-only)

pub mod error_helpers;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use validation::{validate_name, validate_required_text, NameValidationError};
