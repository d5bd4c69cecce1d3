//! Configuration validation utilities

use crate::WardenError;
use std::fmt;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value is out of acceptable range
    OutOfRange {
        field: String,
        min: Option<u64>,
        max: Option<u64>,
        actual: u64,
    },
    /// Value is not one of the accepted choices
    InvalidChoice {
        field: String,
        expected: Vec<String>,
        actual: String,
    },
    /// Custom validation failed
    Custom { field: String, message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                let range_desc = match (min, max) {
                    (Some(min), Some(max)) => format!("between {min} and {max}"),
                    (Some(min), None) => format!("at least {min}"),
                    (None, Some(max)) => format!("at most {max}"),
                    (None, None) => "in valid range".to_string(),
                };
                write!(f, "Field '{field}' must be {range_desc} (got {actual})")
            }
            ValidationError::InvalidChoice {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Field '{field}' must be one of [{}] (got '{actual}')",
                    expected.join(", ")
                )
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates validation failures so every problem is reported at once
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator whose field names are prefixed with `field_name.`
    pub fn for_field(field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: field_name.to_string(),
        }
    }

    /// Validate that a number is within range
    pub fn range(
        &mut self,
        field_name: &str,
        value: u64,
        min: Option<u64>,
        max: Option<u64>,
    ) -> &mut Self {
        let below = min.map(|min| value < min).unwrap_or(false);
        let above = max.map(|max| value > max).unwrap_or(false);
        if below || above {
            self.errors.push(ValidationError::OutOfRange {
                field: self.full_field_name(field_name),
                min,
                max,
                actual: value,
            });
        }
        self
    }

    /// Validate that a string is one of `choices` (case-insensitive)
    pub fn one_of(&mut self, field_name: &str, value: &str, choices: &[&str]) -> &mut Self {
        if !choices.iter().any(|c| c.eq_ignore_ascii_case(value)) {
            self.errors.push(ValidationError::InvalidChoice {
                field: self.full_field_name(field_name),
                expected: choices.iter().map(|c| c.to_string()).collect(),
                actual: value.to_string(),
            });
        }
        self
    }

    /// Record a failed custom check when `condition` is false
    pub fn check(&mut self, field_name: &str, condition: bool, message: &str) -> &mut Self {
        if !condition {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.to_string(),
            });
        }
        self
    }

    /// Absorb the errors of a nested validator
    pub fn merge(&mut self, other: ConfigValidator) -> &mut Self {
        self.errors.extend(other.errors);
        self
    }

    /// Accumulated errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Finish validation
    pub fn finish(self) -> Result<(), WardenError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(WardenError::invalid(format!("configuration invalid: {joined}")))
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{}", self.field_prefix, field_name)
        }
    }
}
