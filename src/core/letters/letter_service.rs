// Remote letter storage workflow.
//
// Saving a letter is three dependent calls against Google Drive / Docs:
//   1. find-or-create the "Letter" folder under the Drive root
//   2. create an empty Google Doc inside it
//   3. insert the letter text at the start of that document
// Each step needs the id produced by the previous one, so they run strictly
// in order. There is no transaction across steps 2 and 3, so a failed insert
// is followed by a compensating delete of the empty document.

use std::sync::Arc;

use super::letter_models::{
    LetterRef, SavedLetter, DOCUMENT_START_INDEX, LETTER_FILE_EXTENSION, LETTER_FOLDER_NAME,
};
use super::letter_ports::{DriveApi, LetterError, LetterIndex};
use crate::core::session::{AccessToken, SessionHandle};

pub struct LetterService {
    drive: Arc<dyn DriveApi>,
    index: Arc<dyn LetterIndex>,
    session: SessionHandle,
}

impl LetterService {
    pub fn new(
        drive: Arc<dyn DriveApi>,
        index: Arc<dyn LetterIndex>,
        session: SessionHandle,
    ) -> Self {
        Self {
            drive,
            index,
            session,
        }
    }

    /// Saves `content` as `<file_name>.docx` in the "Letter" folder.
    pub async fn save_document(
        &self,
        content: &str,
        file_name: &str,
    ) -> Result<SavedLetter, LetterError> {
        let token = self.require_token().await?;

        let folder_id = self.get_or_create_letter_folder(&token).await?;

        let name = format!("{}.{}", file_name, LETTER_FILE_EXTENSION);
        let file_id = self.drive.create_document(&token, &name, &folder_id).await?;
        tracing::info!(%file_id, "Empty Google Docs file created");

        if let Err(e) = self
            .drive
            .insert_text(&token, &file_id, DOCUMENT_START_INDEX, content)
            .await
        {
            self.discard_orphan(&token, &file_id).await;
            return Err(e);
        }

        tracing::info!(%file_id, name = %name, "Content added to Google Docs file");
        Ok(SavedLetter { file_id })
    }

    /// Lists previously saved letters.
    pub async fn list_documents(&self) -> Result<Vec<LetterRef>, LetterError> {
        let token = self.require_token().await?;
        let letters = self.index.fetch_letters(&token).await?;
        tracing::info!(count = letters.len(), "Letters fetched");
        Ok(letters)
    }

    // Fails before any I/O when there is no usable token.
    async fn require_token(&self) -> Result<AccessToken, LetterError> {
        self.session.token().await.ok_or_else(|| {
            tracing::error!("User not authenticated.");
            LetterError::Unauthenticated
        })
    }

    async fn get_or_create_letter_folder(
        &self,
        token: &AccessToken,
    ) -> Result<String, LetterError> {
        let existing = self
            .drive
            .find_root_folders(token, LETTER_FOLDER_NAME)
            .await?;

        if let Some(first) = existing.first() {
            if existing.len() > 1 {
                tracing::warn!(
                    count = existing.len(),
                    using = %first,
                    "Multiple '{}' folders found; using the first one",
                    LETTER_FOLDER_NAME
                );
            }
            tracing::debug!(folder_id = %first, "'{}' folder exists", LETTER_FOLDER_NAME);
            return Ok(first.clone());
        }

        let folder_id = self
            .drive
            .create_root_folder(token, LETTER_FOLDER_NAME)
            .await?;
        tracing::info!(%folder_id, "'{}' folder created", LETTER_FOLDER_NAME);
        Ok(folder_id)
    }

    async fn discard_orphan(&self, token: &AccessToken, file_id: &str) {
        match self.drive.delete_file(token, file_id).await {
            Ok(()) => {
                tracing::warn!(%file_id, "Content insert failed; removed the empty document")
            }
            Err(e) => tracing::error!(
                %file_id,
                "Content insert failed and the empty document could not be removed: {}",
                e
            ),
        }
    }
}
