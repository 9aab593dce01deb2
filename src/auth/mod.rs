//! Supabase JWT verification.
//!
//! Tokens are issued by Supabase Auth; this service only checks them
//! against the project's published signing keys.

pub mod jwks;
pub mod middleware;

use serde::Deserialize;
use uuid::Uuid;

pub use jwks::JwksCache;
pub use middleware::RequireAuth;

/// Claims read from a Supabase access token
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Postgres role, `authenticated` for signed-in users
    #[serde(default)]
    pub role: Option<String>,
}

/// Authenticated caller, attached to a request by [`RequireAuth`]
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        if claims.role.as_deref() == Some("anon") {
            return Err("Anonymous tokens cannot act as a user");
        }

        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn context_carries_user_id() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(&claims(&id.to_string(), Some("authenticated"))).unwrap();
        assert_eq!(ctx.user_id, id);
    }

    #[test]
    fn rejects_non_uuid_subject_and_anon_role() {
        assert!(AuthContext::from_claims(&claims("service", None)).is_err());
        let id = Uuid::new_v4().to_string();
        assert!(AuthContext::from_claims(&claims(&id, Some("anon"))).is_err());
    }
}
