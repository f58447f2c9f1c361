//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Keep file names inside the log directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LogConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::LogConfig;

/// A single semantic problem in a [`LogConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("file_prefix must not be empty")]
    EmptyPrefix,

    #[error("error_tag must not be empty")]
    EmptyErrorTag,

    #[error("max_age_days must be greater than zero")]
    ZeroMaxAge,

    #[error("{0} must be a plain file name component, got {1:?}")]
    NotAFileName(&'static str, String),
}

fn is_file_name_component(value: &str) -> bool {
    !value.contains(['/', '\\']) && value != "." && value != ".."
}

pub fn validate_config(config: &LogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.file_prefix.trim().is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if !is_file_name_component(&config.file_prefix) {
        errors.push(ValidationError::NotAFileName("file_prefix", config.file_prefix.clone()));
    }
    if config.error_tag.trim().is_empty() {
        errors.push(ValidationError::EmptyErrorTag);
    } else if !is_file_name_component(&config.error_tag) {
        errors.push(ValidationError::NotAFileName("error_tag", config.error_tag.clone()));
    }
    if config.max_age_days == 0 {
        errors.push(ValidationError::ZeroMaxAge);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
