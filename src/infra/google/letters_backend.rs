use async_trait::async_trait;
use reqwest::Client;

use crate::core::letters::{LetterError, LetterIndex, LetterRef};
use crate::core::session::AccessToken;

pub const DEFAULT_LETTERS_BACKEND_URL: &str = "https://text-editorbackend.onrender.com";

/// Client for the companion backend that lists the user's saved letters.
pub struct LettersBackendClient {
    client: Client,
    base_url: String,
}

impl LettersBackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LetterIndex for LettersBackendClient {
    async fn fetch_letters(&self, token: &AccessToken) -> Result<Vec<LetterRef>, LetterError> {
        let url = format!("{}/fetch-letters", self.base_url);
        tracing::debug!("Fetching letters from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| LetterError::Api(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Letters backend rejected the request");
            return Err(LetterError::Unauthorized);
        }

        response
            .json::<Vec<LetterRef>>()
            .await
            .map_err(|e| LetterError::Api(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token() -> AccessToken {
        AccessToken::expiring_in("test-token", 3600, "drive.file")
    }

    #[tokio::test]
    async fn returns_letters_for_a_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch-letters"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a1", "name": "To Mum.docx"},
                {"id": "b2", "name": "Resignation.docx"}
            ])))
            .mount(&server)
            .await;

        let letters = LettersBackendClient::new(&server.uri())
            .fetch_letters(&token())
            .await
            .unwrap();

        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].id, "a1");
        assert_eq!(letters[1].display_name(), "Resignation");
    }

    #[tokio::test]
    async fn non_success_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch-letters"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = LettersBackendClient::new(&server.uri())
            .fetch_letters(&token())
            .await;

        assert!(matches!(result, Err(LetterError::Unauthorized)));
    }
}
