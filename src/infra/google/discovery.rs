use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::session::{ApiClientConfigurator, AuthError};

pub const DEFAULT_DRIVE_DISCOVERY_URL: &str =
    "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryDocument {
    name: String,
    version: String,
    #[serde(default)]
    root_url: Option<String>,
}

/// Loads the Drive discovery document with the configured API key. A missing
/// key or a failed load leaves the API client unconfigured.
pub struct DiscoveryClient {
    client: Client,
    api_key: Option<String>,
    discovery_url: String,
}

impl DiscoveryClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_url(api_key, DEFAULT_DRIVE_DISCOVERY_URL)
    }

    pub fn with_url(api_key: Option<String>, discovery_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            discovery_url: discovery_url.to_string(),
        }
    }
}

#[async_trait]
impl ApiClientConfigurator for DiscoveryClient {
    async fn configure(&self) -> Result<(), AuthError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AuthError::MissingConfig("GOOGLE_API_KEY"))?;

        let response = self
            .client
            .get(&self.discovery_url)
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "discovery document request failed ({})",
                response.status()
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        tracing::debug!(
            api = %document.name,
            version = %document.version,
            root = document.root_url.as_deref().unwrap_or("-"),
            "Discovery document loaded"
        );
        Ok(())
    }
}
