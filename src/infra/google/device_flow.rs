// =============================================================================
// OAUTH 2.0 DEVICE AUTHORIZATION GRANT
// =============================================================================
//
// A terminal has no popup window, so interactive consent uses the device
// flow instead:
//
// 1. Ask Google for a device code + short user code.
// 2. Show the user a URL and the user code (the "consent prompt").
// 3. Poll the token endpoint until the user approves, denies, or the code
//    expires.
//
// The same grant backs both the identity sign-in (openid scopes) and the
// Drive token (drive.file scope).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::session::{AccessToken, AuthError, Identity, IdentityProvider, TokenGrant};

pub const DEFAULT_DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Scopes requested when signing the user in.
pub const IDENTITY_SCOPES: &str = "openid email profile";

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// What the user needs to see to approve a device grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentPrompt {
    pub verification_url: String,
    pub user_code: String,
    pub expires_in: u64,
}

/// Callback that shows a consent prompt to the user.
pub type ConsentPrompter = Arc<dyn Fn(&ConsentPrompt) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub device_code_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(alias = "verification_uri")]
    verification_url: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

pub struct DeviceCodeGrant {
    client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    endpoints: OAuthEndpoints,
    prompter: ConsentPrompter,
}

impl DeviceCodeGrant {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        endpoints: OAuthEndpoints,
        prompter: ConsentPrompter,
    ) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            endpoints,
            prompter,
        }
    }

    async fn start(&self, client_id: &str, scope: &str) -> Result<DeviceCodeResponse, AuthError> {
        let response = self
            .client
            .post(&self.endpoints.device_code_url)
            .form(&[("client_id", client_id), ("scope", scope)])
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "Device code request failed ({}): {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn poll(
        &self,
        client_id: &str,
        device: &DeviceCodeResponse,
    ) -> Result<TokenResponse, AuthError> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = device.interval;

        let mut form = vec![
            ("client_id", client_id),
            ("device_code", device.device_code.as_str()),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if tokio::time::Instant::now() > deadline {
                return Err(AuthError::Expired);
            }

            let response = self
                .client
                .post(&self.endpoints.token_url)
                .form(&form)
                .send()
                .await
                .map_err(|e| AuthError::Http(e.to_string()))?;

            if response.status().is_success() {
                return response
                    .json()
                    .await
                    .map_err(|e| AuthError::Provider(e.to_string()));
            }

            let status = response.status();
            let failure: TokenErrorResponse = response
                .json()
                .await
                .map_err(|e| AuthError::Provider(format!("{}: {}", status, e)))?;

            match failure.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => interval += 5,
                "access_denied" => return Err(AuthError::Denied),
                "expired_token" => return Err(AuthError::Expired),
                other => {
                    return Err(AuthError::Provider(match failure.error_description {
                        Some(description) => format!("{}: {}", other, description),
                        None => other.to_string(),
                    }))
                }
            }
        }
    }
}

#[async_trait]
impl TokenGrant for DeviceCodeGrant {
    async fn request_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(AuthError::MissingConfig("GOOGLE_CLIENT_ID"))?;

        let device = self.start(client_id, scope).await?;
        (self.prompter)(&ConsentPrompt {
            verification_url: device.verification_url.clone(),
            user_code: device.user_code.clone(),
            expires_in: device.expires_in,
        });

        let granted = self.poll(client_id, &device).await?;
        Ok(AccessToken::expiring_in(
            granted.access_token,
            granted.expires_in,
            granted.scope.unwrap_or_else(|| scope.to_string()),
        ))
    }
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Google sign-in: a device grant for the openid scopes plus a userinfo call.
pub struct GoogleIdentityProvider {
    grant: DeviceCodeGrant,
    client: Client,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(grant: DeviceCodeGrant) -> Self {
        let userinfo_url = grant.endpoints.userinfo_url.clone();
        Self {
            grant,
            client: Client::new(),
            userinfo_url,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn sign_in(&self) -> Result<Identity, AuthError> {
        let token = self.grant.request_token(IDENTITY_SCOPES).await?;

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "userinfo request failed ({})",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let display_name = info
            .name
            .clone()
            .or_else(|| info.email.clone())
            .ok_or_else(|| AuthError::Provider("userinfo has no name or email".to_string()))?;

        Ok(Identity {
            display_name,
            email: info.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoints(server: &MockServer) -> OAuthEndpoints {
        OAuthEndpoints {
            device_code_url: format!("{}/device/code", server.uri()),
            token_url: format!("{}/token", server.uri()),
            userinfo_url: format!("{}/userinfo", server.uri()),
        }
    }

    fn recording_prompter() -> (ConsentPrompter, Arc<Mutex<Vec<ConsentPrompt>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prompter: ConsentPrompter = Arc::new(move |prompt: &ConsentPrompt| {
            sink.lock().unwrap().push(prompt.clone());
        });
        (prompter, seen)
    }

    async fn mount_device_code(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/device/code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dev-123",
                "user_code": "ABCD-EFGH",
                "verification_url": "https://www.google.com/device",
                "expires_in": 1800,
                "interval": 0
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn missing_client_id_fails_without_network() {
        let server = MockServer::start().await;
        let (prompter, seen) = recording_prompter();
        let grant = DeviceCodeGrant::new(None, None, endpoints(&server), prompter);

        let result = grant.request_token("scope").await;

        assert!(matches!(result, Err(AuthError::MissingConfig("GOOGLE_CLIENT_ID"))));
        assert!(seen.lock().unwrap().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approved_grant_returns_token_and_shows_prompt() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("device_code=dev-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let (prompter, seen) = recording_prompter();
        let grant = DeviceCodeGrant::new(
            Some("client-1".to_string()),
            Some("secret".to_string()),
            endpoints(&server),
            prompter,
        );

        let token = grant.request_token("drive.file").await.unwrap();

        assert_eq!(token.secret(), "ya29.token");
        assert_eq!(token.scope, "drive.file");
        let prompts = seen.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].user_code, "ABCD-EFGH");
    }

    #[tokio::test]
    async fn denied_grant_maps_to_denied() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": "access_denied"})),
            )
            .mount(&server)
            .await;

        let (prompter, _) = recording_prompter();
        let grant =
            DeviceCodeGrant::new(Some("client-1".to_string()), None, endpoints(&server), prompter);

        let result = grant.request_token("drive.file").await;

        assert!(matches!(result, Err(AuthError::Denied)));
    }

    #[tokio::test]
    async fn sign_in_reads_display_name_from_userinfo() {
        let server = MockServer::start().await;
        mount_device_code(&server).await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "id-token",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer id-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com"
            })))
            .mount(&server)
            .await;

        let (prompter, _) = recording_prompter();
        let grant =
            DeviceCodeGrant::new(Some("client-1".to_string()), None, endpoints(&server), prompter);
        let provider = GoogleIdentityProvider::new(grant);

        let identity = provider.sign_in().await.unwrap();

        assert_eq!(identity.display_name, "Ada Lovelace");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
    }
}
