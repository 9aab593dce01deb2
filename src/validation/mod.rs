//! Profile, upload, message and signup validation
//!
//! Validators never fail: bad input is reported as data in a
//! [`ValidationResult`] so callers can render every problem at once.

pub mod fields;
pub mod messages;
pub mod roles;
pub mod sanitize;
pub mod signup;
pub mod uploads;

use serde::Serialize;

pub use messages::*;
pub use roles::*;
pub use sanitize::*;
pub use signup::*;
pub use uploads::*;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    MinLength,
    MaxLength,
    Email,
    Password,
    Username,
    FileSize,
    FileType,
    OutOfRange,
    InvalidUrl,
    InvalidValue,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a validation. `is_valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, kind: ErrorKind, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            kind,
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_error(&self, field: &str, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.field == field && e.kind == kind)
    }

    /// `Ok(())` when valid, otherwise the collected errors
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Character count, not byte length, so accented names measure correctly
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_tracks_errors() {
        let mut result = ValidationResult::new();
        assert!(result.is_valid());
        assert!(result.errors().is_empty());

        result.add_error("bio", ErrorKind::Required, "Bio is required");
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.has_error("bio", ErrorKind::Required));
    }

    #[test]
    fn merge_keeps_all_errors() {
        let mut a = ValidationResult::new();
        a.add_error("full_name", ErrorKind::MinLength, "too short");

        let mut b = ValidationResult::new();
        b.add_error("location", ErrorKind::Required, "required");

        a.merge(b);
        a.merge(ValidationResult::new());
        assert!(!a.is_valid());
        assert_eq!(a.errors().len(), 2);
        assert_eq!(a.into_result().unwrap_err().len(), 2);
    }
}
