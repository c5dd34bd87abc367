use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::core::letters::{DriveApi, LetterError};
use crate::core::session::AccessToken;

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Minimal Google Drive + Docs REST client. It only exposes the calls the
/// letter workflow needs.
pub struct GoogleDriveClient {
    client: Client,
    drive_base: String,
    docs_base: String,
}

impl GoogleDriveClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_DRIVE_API_BASE, DEFAULT_DOCS_API_BASE)
    }

    /// Points the client at other endpoints (used by tests).
    pub fn with_base_urls(drive_base: &str, docs_base: &str) -> Self {
        Self {
            client: Client::new(),
            drive_base: drive_base.trim_end_matches('/').to_string(),
            docs_base: docs_base.trim_end_matches('/').to_string(),
        }
    }

    /// Drive search query for folders called `name` directly under the root.
    pub fn root_folder_query(name: &str) -> String {
        format!(
            "name='{}' and mimeType='{}' and 'root' in parents",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            FOLDER_MIME_TYPE
        )
    }

    async fn send(request: RequestBuilder, token: &AccessToken) -> Result<Response, LetterError> {
        request
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| LetterError::Api(e.to_string()))
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response, LetterError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LetterError::Api(format!("{} failed ({}): {}", what, status, body)))
    }

    async fn create_file(
        &self,
        token: &AccessToken,
        metadata: &NewFile<'_>,
    ) -> Result<String, LetterError> {
        let url = format!("{}/files", self.drive_base);
        tracing::debug!("Creating Drive file '{}' ({})", metadata.name, metadata.mime_type);

        let request = self
            .client
            .post(&url)
            .query(&[("fields", "id")])
            .json(metadata);
        let response = Self::send(request, token).await?;
        let response = Self::ensure_success(response, "files.create").await?;

        let created: ApiFile = response
            .json()
            .await
            .map_err(|e| LetterError::Api(e.to_string()))?;
        Ok(created.id)
    }
}

impl Default for GoogleDriveClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn find_root_folders(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> Result<Vec<String>, LetterError> {
        let url = format!("{}/files", self.drive_base);
        let query = Self::root_folder_query(name);

        let request = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("fields", "files(id, parents)")]);
        let response = Self::send(request, token).await?;
        let response = Self::ensure_success(response, "files.list").await?;

        let list: ApiFileList = response
            .json()
            .await
            .map_err(|e| LetterError::Api(e.to_string()))?;
        Ok(list.files.into_iter().map(|f| f.id).collect())
    }

    async fn create_root_folder(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> Result<String, LetterError> {
        self.create_file(
            token,
            &NewFile {
                name,
                mime_type: FOLDER_MIME_TYPE,
                parents: vec!["root"],
            },
        )
        .await
    }

    async fn create_document(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, LetterError> {
        self.create_file(
            token,
            &NewFile {
                name,
                mime_type: DOCUMENT_MIME_TYPE,
                parents: vec![parent_id],
            },
        )
        .await
    }

    async fn insert_text(
        &self,
        token: &AccessToken,
        document_id: &str,
        index: u32,
        text: &str,
    ) -> Result<(), LetterError> {
        let url = format!("{}/documents/{}:batchUpdate", self.docs_base, document_id);
        let body = BatchUpdateRequest {
            requests: vec![DocumentRequest {
                insert_text: InsertText {
                    location: Location { index },
                    text,
                },
            }],
        };

        let response = Self::send(self.client.post(&url).json(&body), token).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LetterError::ContentInsert {
                file_id: document_id.to_string(),
                reason: format!("{}: {}", status, body),
            });
        }
        Ok(())
    }

    async fn delete_file(&self, token: &AccessToken, file_id: &str) -> Result<(), LetterError> {
        let url = format!("{}/files/{}", self.drive_base, file_id);
        let response = Self::send(self.client.delete(&url), token).await?;
        Self::ensure_success(response, "files.delete").await?;
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFile<'a> {
    name: &'a str,
    mime_type: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiFileList {
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateRequest<'a> {
    requests: Vec<DocumentRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRequest<'a> {
    insert_text: InsertText<'a>,
}

#[derive(Debug, Serialize)]
struct InsertText<'a> {
    location: Location,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Location {
    index: u32,
}
