//! Authentication domain types
//!
//! Registration is proxied to Supabase Auth after local form validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profiles::Role;

/// Sign up form as submitted by the registration page
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub username: String,
    /// Kept as a string so an unknown role surfaces as a field error
    pub role: String,
}

/// Signup result returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub confirmation_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Supabase signup response. Carries tokens only when email confirmation
/// is disabled; otherwise the user object is returned at the top level.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SupabaseSignupResponse {
    Session {
        access_token: String,
        refresh_token: String,
        user: SupabaseUser,
    },
    Pending(SupabaseUser),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub confirmation_sent_at: Option<String>,
}

/// Supabase error body; the field carrying the text differs across versions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SupabaseErrorResponse {
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
}

impl SupabaseErrorResponse {
    pub fn get_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown authentication error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_response_parses_both_shapes() {
        let id = Uuid::new_v4();
        let session = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "user": { "id": id, "email": "ana@example.com" }
        });
        assert!(matches!(
            serde_json::from_value::<SupabaseSignupResponse>(session).unwrap(),
            SupabaseSignupResponse::Session { .. }
        ));

        let pending = serde_json::json!({
            "id": id,
            "email": "ana@example.com",
            "confirmation_sent_at": "2026-01-01T00:00:00Z"
        });
        assert!(matches!(
            serde_json::from_value::<SupabaseSignupResponse>(pending).unwrap(),
            SupabaseSignupResponse::Pending(_)
        ));
    }

    #[test]
    fn error_message_falls_back_through_fields() {
        let err = SupabaseErrorResponse {
            error_description: Some("weak password".into()),
            ..Default::default()
        };
        assert_eq!(err.get_message(), "weak password");
        assert_eq!(
            SupabaseErrorResponse::default().get_message(),
            "Unknown authentication error"
        );
    }
}
