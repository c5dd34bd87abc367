// =============================================================================
// SERVICE ACCOUNT GRANT
// =============================================================================
//
// Silent alternative to the device flow for unattended use: a service account
// signs a JWT assertion (RS256) and exchanges it for an access token.
//
// Letters then land in the service account's own Drive unless a folder is
// shared with it.
//
// **Environment Variables:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to service account JSON file
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - Service account JSON content (alternative)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::session::{AccessToken, AuthError, TokenGrant};

/// Lifetime requested for each signed assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are refreshed instead of reused.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct ServiceAccountGrant {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached: Arc<RwLock<Option<AccessToken>>>,
}

impl ServiceAccountGrant {
    pub async fn from_file(path: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Provider(format!("cannot read {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| AuthError::Provider(format!("invalid service account key: {}", e)))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    async fn cached_for(&self, scope: &str) -> Option<AccessToken> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|token| token.scope == scope)
            .filter(|token| {
                token.is_valid_at(Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS))
            })
            .cloned()
    }

    fn signed_assertion(&self, scope: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.credentials.client_email,
            scope,
            aud: &self.credentials.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::Provider(format!("invalid private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| AuthError::Provider(format!("cannot sign assertion: {}", e)))
    }

    async fn fetch_new_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let jwt = self.signed_assertion(scope)?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        let granted: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(AccessToken::expiring_in(
            granted.access_token,
            granted.expires_in,
            scope,
        ))
    }
}

#[async_trait]
impl TokenGrant for ServiceAccountGrant {
    async fn request_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.cached_for(scope).await {
            return Ok(token);
        }

        let token = self.fetch_new_token(scope).await?;
        tracing::debug!(account = %self.credentials.client_email, "Service account token issued");
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }
}
