use super::letter_models::LetterRef;
use crate::core::session::AccessToken;
use async_trait::async_trait;

/// Errors raised while saving or listing letters.
#[derive(Debug, thiserror::Error)]
pub enum LetterError {
    #[error("User not authenticated")]
    Unauthenticated,
    #[error("Unauthorized request")]
    Unauthorized,
    #[error("Document storage API error: {0}")]
    Api(String),
    #[error("Failed to insert content into {file_id}: {reason}")]
    ContentInsert { file_id: String, reason: String },
}

/// The handful of Drive / Docs operations the save workflow needs.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Ids of folders named `name` directly under the Drive root, in the
    /// order the service returned them.
    async fn find_root_folders(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> Result<Vec<String>, LetterError>;

    async fn create_root_folder(&self, token: &AccessToken, name: &str)
        -> Result<String, LetterError>;

    /// Creates an empty Google Docs document and returns its file id.
    async fn create_document(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, LetterError>;

    async fn insert_text(
        &self,
        token: &AccessToken,
        document_id: &str,
        index: u32,
        text: &str,
    ) -> Result<(), LetterError>;

    async fn delete_file(&self, token: &AccessToken, file_id: &str) -> Result<(), LetterError>;
}

/// Listing of previously saved letters (served by a separate backend).
#[async_trait]
pub trait LetterIndex: Send + Sync {
    async fn fetch_letters(&self, token: &AccessToken) -> Result<Vec<LetterRef>, LetterError>;
}
