//! Shared validation utilities
//!
//! Length and presence checks shared by the dataset and community commands.
//!
//! # Examples
//!
//! ```rust,ignore
//! use hub_server::features::shared::validation::{validate_name, validate_required_text};
//!
//! validate_name("Game analytics", 50)?;
//! validate_required_text("Sales figures", 255)?;
//! ```

use thiserror::Error;

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur during free text validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextValidationError {
    #[error("Text is required and cannot be empty")]
    Required,

    #[error("Text must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

/// Validate a name field
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed max_length characters (after trimming)
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NameValidationError::Required);
    }

    if name.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate a required free text field such as a description
pub fn validate_required_text(text: &str, max_length: usize) -> Result<(), TextValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TextValidationError::Required);
    }

    if text.chars().count() > max_length {
        return Err(TextValidationError::TooLong { max_length });
    }

    Ok(())
}
