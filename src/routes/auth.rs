//! Registration routes
//!
//! The form is validated here; account creation itself is proxied to
//! Supabase Auth, after which the profile row is created.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::domain::auth::{
    SignUpRequest, SignUpResponse, SupabaseErrorResponse, SupabaseSignupResponse,
};
use crate::domain::profiles::Role;
use crate::error::ApiError;
use crate::validation::{sanitize_text, validate_signup, ErrorKind};

#[derive(Debug, Serialize)]
pub struct SignupValidation {
    pub valid: bool,
}

/// Form rules plus username availability
async fn check_signup(state: &AppState, req: &SignUpRequest) -> Result<Role, ApiError> {
    let mut result = validate_signup(req);

    let username_ok = !result.errors().iter().any(|e| e.field == "username");
    if username_ok && state.profiles.username_taken(&sanitize_text(&req.username)).await? {
        result.add_error("username", ErrorKind::Username, "This username is already taken");
    }

    ApiError::check(result)?;
    Role::from_str(&req.role).map_err(ApiError::bad_request)
}

/// POST /auth/signup/validate
///
/// Validate a registration form without creating anything.
pub async fn validate_signup_form(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_signup(&state, &req).await?;
    Ok(DataResponse::new(SignupValidation { valid: true }))
}

/// POST /auth/signup
///
/// Register with Supabase and create the matching profile.
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = check_signup(&state, &req).await?;
    let email = req.email.trim().to_lowercase();
    let username = sanitize_text(&req.username);
    let full_name = sanitize_text(&req.full_name);

    let supabase_req = serde_json::json!({
        "email": email,
        "password": req.password,
        "data": {
            "username": &username,
            "full_name": &full_name,
            "role": role.as_str(),
        }
    });

    let response = state
        .http_client
        .post(format!("{}/auth/v1/signup", state.settings.supabase_url))
        .header("apikey", &state.settings.supabase_anon_key)
        .json(&supabase_req)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to connect to auth service: {}", e)))?;

    if !response.status().is_success() {
        let error: SupabaseErrorResponse = response.json().await.unwrap_or_default();
        return Err(ApiError::bad_request(error.get_message()));
    }

    let signup: SupabaseSignupResponse = response
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to parse auth response: {}", e)))?;

    let (user, access_token, refresh_token) = match signup {
        SupabaseSignupResponse::Session {
            access_token,
            refresh_token,
            user,
        } => (user, Some(access_token), Some(refresh_token)),
        SupabaseSignupResponse::Pending(user) => (user, None, None),
    };

    state
        .profiles
        .create_profile(user.id, &username, &full_name, role)
        .await?;

    tracing::info!(user_id = %user.id, role = %role, "User registered");

    Ok(Created(SignUpResponse {
        user_id: user.id,
        email: user.email.unwrap_or(email),
        role,
        confirmation_required: access_token.is_none(),
        access_token,
        refresh_token,
    }))
}
