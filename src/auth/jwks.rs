//! Signing-key cache for Supabase access tokens

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Claims;

/// Minimum spacing between fetches triggered by an unknown `kid`
const REFETCH_COOLDOWN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// RSA keys of a key set by `kid`; other key types are skipped
fn rsa_keys(set: JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::new();
    for jwk in set.keys {
        let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
            continue;
        };
        if jwk.kty != "RSA" {
            continue;
        }
        match DecodingKey::from_rsa_components(&n, &e) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(err) => tracing::warn!(kid = %kid, error = %err, "Skipping unusable JWK"),
        }
    }
    keys
}

#[derive(Default)]
struct KeyState {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// Verifies RS256 tokens against the project's JWKS, refreshing the key set
/// when it expires or when a token names a key it has not seen.
#[derive(Clone)]
pub struct JwksCache {
    state: Arc<RwLock<KeyState>>,
    http: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwksCache {
    pub fn new(
        http: reqwest::Client,
        jwks_url: String,
        issuer: String,
        audience: String,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(KeyState::default())),
            http,
            jwks_url,
            issuer,
            audience,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Invalid JWT header")?;
        let kid = header.kid.context("JWT missing kid header")?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &key, &validation).context("JWT validation failed")?;
        Ok(data.claims)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
        let refetch = {
            let state = self.state.read();
            let fresh = state.fetched_at.is_some_and(|at| at.elapsed() < self.ttl);
            match state.keys.get(kid) {
                Some(key) if fresh => return Ok(key.clone()),
                // Unknown kid on a fresh set: maybe rotated, but don't hammer the endpoint
                None if fresh => state
                    .fetched_at
                    .map_or(true, |at| at.elapsed() >= REFETCH_COOLDOWN),
                _ => true,
            }
        };

        if refetch {
            self.refresh().await?;
        }

        self.state
            .read()
            .keys
            .get(kid)
            .cloned()
            .with_context(|| format!("Signing key {} not found in JWKS", kid))
    }

    async fn refresh(&self) -> Result<()> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http
            .get(&self.jwks_url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to fetch JWKS")?;

        if !response.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status: {}", response.status());
        }

        let set: JwkSet = response.json().await.context("Failed to parse JWKS")?;
        let keys = rsa_keys(set);

        let mut state = self.state.write();
        state.keys = keys;
        state.fetched_at = Some(Instant::now());
        tracing::info!(keys = state.keys.len(), "JWKS refreshed");
        Ok(())
    }

    /// Fetch the key set ahead of the first request
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_complete_rsa_keys_are_kept() {
        let set: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "rsa-1", "kty": "RSA", "alg": "RS256", "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw", "e": "AQAB" },
                { "kid": "ec-1", "kty": "EC", "crv": "P-256", "x": "abc", "y": "def" },
                { "kty": "RSA", "n": "abc", "e": "AQAB" }
            ]
        }))
        .unwrap();

        let keys = rsa_keys(set);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("rsa-1"));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_without_fetching() {
        let cache = JwksCache::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/jwks".into(),
            "https://proj.supabase.co/auth/v1".into(),
            "authenticated".into(),
            60,
        );
        assert!(cache.verify_token("not-a-jwt").await.is_err());
        assert!(cache.state.read().fetched_at.is_none());
    }
}
