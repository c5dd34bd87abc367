// Token acquisition for the document-storage API.
//
// The service is a tiny state machine with two readiness flags. Both the API
// client (API key + discovery document) and the token client (grant bound to
// a scope) must be initialized before a token may be requested.

use super::auth_ports::{ApiClientConfigurator, AuthError, TokenGrant};
use super::session_models::{AccessToken, SessionHandle};

/// Scope that lets us create and edit files the app itself created.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Google API not loaded properly")]
    NotReady,
    #[error("Google login error: {0}")]
    Grant(#[from] AuthError),
}

/// A grant bound to a fixed scope, created by `initialize_identity_client`.
struct TokenClient {
    scope: &'static str,
}

pub struct TokenService {
    configurator: Box<dyn ApiClientConfigurator>,
    grant: Box<dyn TokenGrant>,
    session: SessionHandle,
    token_client: Option<TokenClient>,
    api_client_ready: bool,
    identity_client_ready: bool,
}

impl TokenService {
    pub fn new(
        configurator: Box<dyn ApiClientConfigurator>,
        grant: Box<dyn TokenGrant>,
        session: SessionHandle,
    ) -> Self {
        Self {
            configurator,
            grant,
            session,
            token_client: None,
            api_client_ready: false,
            identity_client_ready: false,
        }
    }

    #[cfg(test)]
    pub fn api_client_ready(&self) -> bool {
        self.api_client_ready
    }

    #[cfg(test)]
    pub fn identity_client_ready(&self) -> bool {
        self.identity_client_ready
    }

    pub fn is_ready(&self) -> bool {
        self.api_client_ready && self.identity_client_ready
    }

    /// Configures the storage API client. A failure leaves the flag unset, so
    /// every later token request reports `NotReady`.
    pub async fn initialize_api_client(&mut self) {
        match self.configurator.configure().await {
            Ok(()) => {
                self.api_client_ready = true;
                tracing::info!("Storage API client initialized");
            }
            Err(e) => {
                tracing::error!("Failed to initialize storage API client: {}", e);
            }
        }
    }

    pub fn initialize_identity_client(&mut self) {
        self.token_client = Some(TokenClient {
            scope: DRIVE_FILE_SCOPE,
        });
        self.identity_client_ready = true;
    }

    /// Requests a token and installs it in the session.
    ///
    /// Unlike a bare callback, the caller gets the outcome and can tell a
    /// granted token apart from a denied or failed grant.
    pub async fn request_access_token(&self) -> Result<AccessToken, TokenError> {
        let scope = match (&self.token_client, self.is_ready()) {
            (Some(client), true) => client.scope,
            _ => {
                tracing::error!("Google API not loaded properly.");
                return Err(TokenError::NotReady);
            }
        };

        match self.grant.request_token(scope).await {
            Ok(token) => {
                self.session.install_token(token.clone()).await;
                tracing::info!("Google authentication successful");
                Ok(token)
            }
            Err(e) => {
                tracing::error!("Google login error: {}", e);
                Err(e.into())
            }
        }
    }
}
