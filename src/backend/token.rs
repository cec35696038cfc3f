//! Service-account access tokens for Fleet Engine
//!
//! An RS256-signed JWT assertion is exchanged at the OAuth token endpoint
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer`). The resulting bearer
//! token is kept until shortly before it expires.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::backend::database::upstream_error;
use crate::config::FleetSettings;
use crate::error::{AppError, Result};

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the assertion itself
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are refreshed once fewer than this many seconds remain
const REFRESH_MARGIN_SECS: u64 = 60;

/// Upper bound on the lifetime accepted from the token endpoint
const MAX_TOKEN_LIFETIME_SECS: u64 = 86_400;

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Build the signed assertion for `issued_at` (unix seconds)
pub fn build_assertion(settings: &FleetSettings, issued_at: i64) -> Result<String> {
    if settings.client_email.is_empty() {
        return Err(AppError::MissingConfig("fleet.client_email"));
    }
    if settings.private_key.is_empty() {
        return Err(AppError::MissingConfig("fleet.private_key"));
    }

    let claims = AssertionClaims {
        iss: settings.client_email.clone(),
        sub: settings.client_email.clone(),
        scope: settings.scope.clone(),
        aud: settings.token_uri.clone(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let key = EncodingKey::from_rsa_pem(settings.private_key_pem().as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

/// Mints and caches access tokens
pub struct TokenProvider {
    client: Client,
    settings: FleetSettings,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, settings: FleetSettings) -> Self {
        Self {
            client,
            settings,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token; `expires_in` reflects the remaining lifetime
    pub async fn access_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cached_token() {
            debug!("Using cached Fleet Engine access token");
            return Ok(token);
        }

        let mut token = self.exchange().await?;
        token.expires_in = token.expires_in.min(MAX_TOKEN_LIFETIME_SECS);

        if let Some(expires_at) = Instant::now().checked_add(Duration::from_secs(token.expires_in)) {
            *self.cached.lock() = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        Ok(token)
    }

    fn cached_token(&self) -> Option<AccessToken> {
        let cached = self.cached.lock();
        let entry = cached.as_ref()?;

        let remaining = entry.expires_at.checked_duration_since(Instant::now())?;
        if remaining.as_secs() <= REFRESH_MARGIN_SECS {
            return None;
        }

        let mut token = entry.token.clone();
        token.expires_in = remaining.as_secs();
        Some(token)
    }

    async fn exchange(&self) -> Result<AccessToken> {
        let assertion = build_assertion(&self.settings, Utc::now().timestamp())?;

        let response = self
            .client
            .post(&self.settings.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("oauth", response).await);
        }

        let token: AccessToken = response.json().await?;
        info!(expires_in = token.expires_in, "Minted Fleet Engine access token");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pub.pem");

    fn fleet_settings() -> FleetSettings {
        FleetSettings {
            provider_id: "test-project".to_string(),
            client_email: "fleet@test-project.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_assertion_claims_verify_with_public_key() {
        let settings = fleet_settings();
        let now = Utc::now().timestamp();
        let assertion = build_assertion(&settings, now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[settings.token_uri.as_str()]);
        validation.set_issuer(&[settings.client_email.as_str()]);

        let decoded = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.alg, Algorithm::RS256);
        assert_eq!(decoded.claims.sub, settings.client_email);
        assert_eq!(decoded.claims.scope, settings.scope);
        assert_eq!(decoded.claims.iat, now);
        assert_eq!(decoded.claims.exp, now + ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_assertion_accepts_escaped_newlines() {
        let mut settings = fleet_settings();
        settings.private_key = PRIVATE_KEY.replace('\n', "\\n");

        assert!(build_assertion(&settings, Utc::now().timestamp()).is_ok());
    }

    #[test]
    fn test_assertion_requires_credentials() {
        let mut settings = fleet_settings();
        settings.private_key.clear();

        let err = build_assertion(&settings, 0).unwrap_err();
        assert!(matches!(err, AppError::MissingConfig("fleet.private_key")));
    }

    #[test]
    fn test_assertion_rejects_garbage_key() {
        let mut settings = fleet_settings();
        settings.private_key = "not a key".to_string();

        assert!(matches!(build_assertion(&settings, 0), Err(AppError::Jwt(_))));
    }
}
