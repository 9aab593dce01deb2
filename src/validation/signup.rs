//! Registration form rules

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::auth::SignUpRequest;
use crate::domain::profiles::Role;

use super::fields::{validate_full_name, validate_signup_username};
use super::sanitize::sanitize_text;
use super::{ErrorKind, ValidationResult};

pub const PASSWORD_MIN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

pub fn validate_email(email: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let email = email.trim();

    if email.is_empty() {
        result.add_error("email", ErrorKind::Required, "Email is required");
    } else if !EMAIL_RE.is_match(email) {
        result.add_error("email", ErrorKind::Email, "Email address is not valid");
    }

    result
}

/// At least 8 characters with one letter and one digit
pub fn validate_password(password: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if password.is_empty() {
        result.add_error("password", ErrorKind::Required, "Password is required");
    } else if password.chars().count() < PASSWORD_MIN {
        result.add_error(
            "password",
            ErrorKind::Password,
            format!("Password must be at least {} characters", PASSWORD_MIN),
        );
    } else if !password.chars().any(|c| c.is_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        result.add_error(
            "password",
            ErrorKind::Password,
            "Password must contain at least one letter and one number",
        );
    }

    result
}

pub fn validate_signup(form: &SignUpRequest) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(validate_email(&form.email));
    result.merge(validate_password(&form.password));
    if form.password != form.confirm_password {
        result.add_error("confirm_password", ErrorKind::Password, "Passwords do not match");
    }
    // Checked as stored: sanitizing can empty a name made of angle brackets
    result.merge(validate_full_name(&sanitize_text(&form.full_name)));
    result.merge(validate_signup_username(&sanitize_text(&form.username)));
    if form.role.parse::<Role>().is_err() {
        result.add_error("role", ErrorKind::InvalidValue, "Please choose a valid role");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SignUpRequest {
        SignUpRequest {
            email: "ana@example.com".into(),
            password: "lentes2024".into(),
            confirm_password: "lentes2024".into(),
            full_name: "Ana Torres".into(),
            username: "ana_foto".into(),
            role: "photographer".into(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_signup(&form()).is_valid());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("ana@example.com").is_valid());
        assert!(validate_email("").has_error("email", ErrorKind::Required));
        assert!(validate_email("ana@example").has_error("email", ErrorKind::Email));
        assert!(validate_email("ana example@x.com").has_error("email", ErrorKind::Email));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short1").has_error("password", ErrorKind::Password));
        assert!(validate_password("onlyletters").has_error("password", ErrorKind::Password));
        assert!(validate_password("12345678").has_error("password", ErrorKind::Password));
        assert!(validate_password("letters123").is_valid());
    }

    #[test]
    fn form_collects_all_problems() {
        let bad = SignUpRequest {
            email: "nope".into(),
            confirm_password: "different1".into(),
            username: "a very long username indeed".into(),
            role: "director".into(),
            ..form()
        };
        let result = validate_signup(&bad);
        assert!(result.has_error("email", ErrorKind::Email));
        assert!(result.has_error("confirm_password", ErrorKind::Password));
        assert!(result.has_error("username", ErrorKind::Username));
        assert!(result.has_error("role", ErrorKind::InvalidValue));
        assert_eq!(result.errors().len(), 4);
    }

    #[test]
    fn name_of_only_angle_brackets_is_rejected() {
        let bad = SignUpRequest {
            full_name: "<<>>".into(),
            ..form()
        };
        let result = validate_signup(&bad);
        assert!(!result.is_valid());
        assert!(result.errors().iter().any(|e| e.field == "full_name"));
    }
}
