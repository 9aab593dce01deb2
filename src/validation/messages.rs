//! Contact message and portfolio metadata rules

use super::{char_len, ErrorKind, ValidationResult};

pub const SUBJECT_MAX: usize = 100;
pub const BODY_MAX: usize = 1000;
pub const ALT_TEXT_MAX: usize = 200;

pub fn validate_contact_message(subject: &str, body: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if subject.trim().is_empty() {
        result.add_error("subject", ErrorKind::Required, "Subject is required");
    } else if char_len(subject) > SUBJECT_MAX {
        result.add_error(
            "subject",
            ErrorKind::MaxLength,
            format!("Subject must be at most {} characters", SUBJECT_MAX),
        );
    }

    if body.trim().is_empty() {
        result.add_error("body", ErrorKind::Required, "Message is required");
    } else if char_len(body) > BODY_MAX {
        result.add_error(
            "body",
            ErrorKind::MaxLength,
            format!("Message must be at most {} characters", BODY_MAX),
        );
    }

    result
}

pub fn validate_portfolio_image(alt_text: Option<&str>, sort_order: i32) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(alt) = alt_text {
        if char_len(alt) > ALT_TEXT_MAX {
            result.add_error(
                "alt_text",
                ErrorKind::MaxLength,
                format!("Alt text must be at most {} characters", ALT_TEXT_MAX),
            );
        }
    }

    if sort_order < 0 {
        result.add_error("sort_order", ErrorKind::OutOfRange, "Sort order cannot be negative");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_requires_subject_and_body() {
        let result = validate_contact_message("", "  ");
        assert!(result.has_error("subject", ErrorKind::Required));
        assert!(result.has_error("body", ErrorKind::Required));
        assert!(validate_contact_message("Booking", "Are you free on Friday?").is_valid());
    }

    #[test]
    fn message_length_limits() {
        assert!(validate_contact_message(&"s".repeat(100), &"b".repeat(1000)).is_valid());

        let result = validate_contact_message(&"s".repeat(101), &"b".repeat(1001));
        assert!(result.has_error("subject", ErrorKind::MaxLength));
        assert!(result.has_error("body", ErrorKind::MaxLength));
    }

    #[test]
    fn portfolio_metadata() {
        assert!(validate_portfolio_image(Some(&"a".repeat(200)), 0).is_valid());
        assert!(validate_portfolio_image(None, 7).is_valid());
        assert!(validate_portfolio_image(Some(&"a".repeat(201)), 0).has_error("alt_text", ErrorKind::MaxLength));
        assert!(validate_portfolio_image(None, -1).has_error("sort_order", ErrorKind::OutOfRange));
    }
}
