use super::session_models::{AccessToken, Identity};
use async_trait::async_trait;

/// Things that can go wrong while talking to an OAuth / identity provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("The user denied the consent request")]
    Denied,
    #[error("The consent request expired before it was approved")]
    Expired,
    #[error("Identity provider error: {0}")]
    Provider(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

/// Interactive sign-in that produces "who is the user".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<Identity, AuthError>;
}

/// Obtains an access token for a given OAuth scope, interactively or silently.
#[async_trait]
pub trait TokenGrant: Send + Sync {
    async fn request_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}

/// Prepares the storage API client (API key + discovery document).
#[async_trait]
pub trait ApiClientConfigurator: Send + Sync {
    async fn configure(&self) -> Result<(), AuthError>;
}
