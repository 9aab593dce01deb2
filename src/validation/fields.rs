//! Shared field rules for profile text and numeric attributes

use url::Url;

use super::{char_len, ErrorKind, ValidationResult};

pub const FULL_NAME_MIN: usize = 2;
pub const FULL_NAME_MAX: usize = 100;
pub const BIO_MIN: usize = 10;
pub const BIO_MAX: usize = 500;
pub const LOCATION_MIN: usize = 2;
pub const LOCATION_MAX: usize = 100;
pub const USERNAME_MIN: usize = 3;
/// Upper bound enforced by the registration form
pub const SIGNUP_USERNAME_MAX: usize = 20;
/// Upper bound enforced when a profile is edited
pub const PROFILE_USERNAME_MAX: usize = 30;

/// Required text: trimmed length at least `min`, raw length at most `max`
fn required_text(
    result: &mut ValidationResult,
    field: &str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        result.add_error(field, ErrorKind::Required, format!("{} is required", label));
    } else if char_len(trimmed) < min {
        result.add_error(
            field,
            ErrorKind::MinLength,
            format!("{} must be at least {} characters", label, min),
        );
    } else if char_len(value) > max {
        result.add_error(
            field,
            ErrorKind::MaxLength,
            format!("{} must be at most {} characters", label, max),
        );
    }
}

pub fn validate_full_name(value: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    required_text(&mut result, "full_name", "Full name", value, FULL_NAME_MIN, FULL_NAME_MAX);
    result
}

pub fn validate_bio(value: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    required_text(&mut result, "bio", "Bio", value, BIO_MIN, BIO_MAX);
    result
}

pub fn validate_location(value: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    required_text(&mut result, "location", "Location", value, LOCATION_MIN, LOCATION_MAX);
    result
}

fn username(value: &str, max: usize) -> ValidationResult {
    let mut result = ValidationResult::new();
    let len = char_len(value);

    if value.is_empty() {
        result.add_error("username", ErrorKind::Required, "Username is required");
    } else if len < USERNAME_MIN || len > max {
        result.add_error(
            "username",
            ErrorKind::Username,
            format!("Username must be between {} and {} characters", USERNAME_MIN, max),
        );
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        result.add_error(
            "username",
            ErrorKind::Username,
            "Username may only contain letters, numbers, underscores and hyphens",
        );
    }

    result
}

/// Username rules of the registration form (3-20 characters)
pub fn validate_signup_username(value: &str) -> ValidationResult {
    username(value, SIGNUP_USERNAME_MAX)
}

/// Username rules of the profile editor (3-30 characters)
pub fn validate_profile_username(value: &str) -> ValidationResult {
    username(value, PROFILE_USERNAME_MAX)
}

/// Inclusive numeric range check on an optional value
pub(crate) fn check_range<T>(result: &mut ValidationResult, field: &str, value: Option<T>, min: T, max: T)
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(v) = value {
        if v < min || v > max {
            result.add_error(
                field,
                ErrorKind::OutOfRange,
                format!("{} must be between {} and {}", field, min, max),
            );
        }
    }
}

pub(crate) fn check_max_len(result: &mut ValidationResult, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
        if char_len(v) > max {
            result.add_error(
                field,
                ErrorKind::MaxLength,
                format!("{} must be at most {} characters", field, max),
            );
        }
    }
}

pub(crate) fn check_max_items(result: &mut ValidationResult, field: &str, items: &[String], max: usize) {
    if items.len() > max {
        result.add_error(
            field,
            ErrorKind::MaxLength,
            format!("{} may list at most {} entries", field, max),
        );
    }
}

/// Must parse as an absolute URL; relative references are rejected
pub(crate) fn check_url(result: &mut ValidationResult, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        if Url::parse(v.trim()).is_err() {
            result.add_error(field, ErrorKind::InvalidUrl, format!("{} must be a valid URL", field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_bounds() {
        assert!(validate_full_name("Al").is_valid());
        assert!(validate_full_name(&"a".repeat(100)).is_valid());
        assert!(validate_full_name("A").has_error("full_name", ErrorKind::MinLength));
        assert!(validate_full_name("  A  ").has_error("full_name", ErrorKind::MinLength));
        assert!(validate_full_name("").has_error("full_name", ErrorKind::Required));
        assert!(validate_full_name("   ").has_error("full_name", ErrorKind::Required));
        assert!(validate_full_name(&"a".repeat(101)).has_error("full_name", ErrorKind::MaxLength));
    }

    #[test]
    fn bio_bounds() {
        assert!(validate_bio("Ten chars!").is_valid());
        assert!(validate_bio("Short").has_error("bio", ErrorKind::MinLength));
        assert!(validate_bio(&"b".repeat(500)).is_valid());
        assert!(validate_bio(&"b".repeat(501)).has_error("bio", ErrorKind::MaxLength));
    }

    #[test]
    fn location_bounds() {
        assert!(validate_location("NY").is_valid());
        assert!(validate_location("").has_error("location", ErrorKind::Required));
        assert!(validate_location(&"l".repeat(101)).has_error("location", ErrorKind::MaxLength));
    }

    #[test]
    fn lengths_count_characters() {
        // 100 two-byte characters is still 100 characters
        assert!(validate_full_name(&"é".repeat(100)).is_valid());
    }

    #[test]
    fn username_limits_differ_between_signup_and_profile() {
        let name = "a".repeat(25);
        assert!(!validate_signup_username(&name).is_valid());
        assert!(validate_profile_username(&name).is_valid());

        assert!(validate_signup_username(&"a".repeat(20)).is_valid());
        assert!(!validate_profile_username(&"a".repeat(31)).is_valid());
    }

    #[test]
    fn username_charset() {
        assert!(validate_signup_username("ana_foto-23").is_valid());
        assert!(validate_signup_username("ab").has_error("username", ErrorKind::Username));
        assert!(validate_signup_username("ana foto").has_error("username", ErrorKind::Username));
        assert!(validate_signup_username("ana.foto").has_error("username", ErrorKind::Username));
        assert!(validate_signup_username("añana").has_error("username", ErrorKind::Username));
        assert!(validate_signup_username("").has_error("username", ErrorKind::Required));
    }

    #[test]
    fn url_must_be_absolute() {
        let mut result = ValidationResult::new();
        check_url(&mut result, "portfolio_url", Some("https://ana.photo/work"));
        assert!(result.is_valid());

        check_url(&mut result, "portfolio_url", Some("ana.photo/work"));
        assert!(result.has_error("portfolio_url", ErrorKind::InvalidUrl));
    }
}
