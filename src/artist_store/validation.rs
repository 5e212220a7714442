//! Validation for artist profiles.
//!
//! Runs before anything is rendered or written, so a rejected profile never
//! reaches the store.

use super::models::ArtistProfile;
use std::fmt;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField {
        field: &'static str,
    },
    NonPositiveValue {
        field: &'static str,
        value: i64,
    },
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
    MissingMatchedId,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::NonPositiveValue { field, value } => {
                write!(f, "Field '{}' must be positive, got {}", field, value)
            }
            ValidationError::OutOfRange { field, value, max } => {
                write!(f, "Field '{}' must be at most {}, got {}", field, max, value)
            }
            ValidationError::MissingMatchedId => {
                write!(f, "Field 'matchedId' is required when 'exists' is true")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an artist profile
pub fn validate_profile(profile: &ArtistProfile) -> ValidationResult<()> {
    if profile.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    if profile.height_cm == Some(0) {
        return Err(ValidationError::NonPositiveValue {
            field: "heightCm",
            value: 0,
        });
    }
    if let Some(guarantee) = profile.guarantee_krw {
        if guarantee > i64::MAX as u64 {
            return Err(ValidationError::OutOfRange {
                field: "guaranteeKrw",
                value: guarantee,
                max: i64::MAX as u64,
            });
        }
    }
    Ok(())
}

/// Validate the `(exists, matchedId)` pair that selects INSERT or UPDATE.
pub fn validate_target(exists: bool, matched_id: Option<i64>) -> ValidationResult<Option<i64>> {
    match (exists, matched_id) {
        (true, None) => Err(ValidationError::MissingMatchedId),
        (true, Some(id)) if id <= 0 => Err(ValidationError::NonPositiveValue {
            field: "matchedId",
            value: id,
        }),
        (true, Some(id)) => Ok(Some(id)),
        (false, _) => Ok(None),
    }
}
