// The editor screen: rich-text widget, file-name input, toolbar, local drafts
// and the Google Drive actions.
//
// Every handler turns failures into a notice for the user and a log line for
// us. Nothing here returns an error to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

use super::notifier::{Notice, Notifier};
use super::rich_text::{RichTextEditor, ToolbarCommand};
use crate::core::drafts::DraftService;
use crate::core::letters::{LetterRef, LetterService};
use crate::core::session::{SessionHandle, TokenError, TokenService};

const DRAFT_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Shared "a remote call is in flight" flag.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises the flag, or returns `None` when it is already raised. The flag
    /// drops back when the guard goes out of scope, on every exit path.
    fn begin(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard(self.clone()))
    }
}

struct LoadingGuard(LoadingFlag);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

pub struct EditorView {
    editor: RichTextEditor,
    file_name: String,
    loading: LoadingFlag,
    drafts: DraftService,
    letters: Vec<LetterRef>,
    letter_service: LetterService,
    token_service: TokenService,
    session: SessionHandle,
    notifier: Arc<dyn Notifier>,
    timezone: Tz,
}

impl EditorView {
    pub fn new(
        drafts: DraftService,
        letter_service: LetterService,
        token_service: TokenService,
        session: SessionHandle,
        notifier: Arc<dyn Notifier>,
        timezone: Tz,
    ) -> Self {
        Self {
            editor: RichTextEditor::default(),
            file_name: String::new(),
            loading: LoadingFlag::default(),
            drafts,
            letters: Vec::new(),
            letter_service,
            token_service,
            session,
            notifier,
            timezone,
        }
    }

    /// Prepares the Google API and token clients. Runs once, when the view
    /// first appears.
    pub async fn mount(&mut self) {
        self.token_service.initialize_api_client().await;
        self.token_service.initialize_identity_client();
    }

    /// Forgets the letter being written and the fetched letter list. Local
    /// drafts belong to this machine and stay.
    pub fn reset(&mut self) {
        self.editor = RichTextEditor::default();
        self.file_name.clear();
        self.letters.clear();
    }

    // ---- widget & inputs --------------------------------------------------

    #[cfg(test)]
    pub fn editor(&self) -> &RichTextEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut RichTextEditor {
        &mut self.editor
    }

    pub fn toolbar(&mut self, command: ToolbarCommand) -> bool {
        let applied = self.editor.apply(command);
        if !applied {
            tracing::debug!(?command, "Toolbar command had nothing to act on");
        }
        applied
    }

    #[cfg(test)]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = name.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    #[cfg(test)]
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    #[cfg(test)]
    pub fn drafts(&self) -> &[crate::core::drafts::draft_models::Draft] {
        self.drafts.list()
    }

    #[cfg(test)]
    pub fn letters(&self) -> &[LetterRef] {
        &self.letters
    }

    // ---- local drafts -----------------------------------------------------

    pub fn handle_save_draft(&mut self) {
        let content = self.editor.get_html();
        match self.drafts.save(content) {
            Ok(_) => self.notifier.notify(Notice::success("Draft saved locally!")),
            Err(e) => {
                tracing::error!("Error saving draft: {}", e);
                self.notifier.notify(Notice::error("Failed to save draft."));
            }
        }
    }

    /// Puts draft `index` (zero-based) back into the editor.
    pub fn handle_load_draft(&mut self, index: usize) {
        let content = match self.drafts.load(index) {
            Ok(draft) => draft.content.clone(),
            Err(e) => {
                tracing::warn!("{}", e);
                self.notifier
                    .notify(Notice::error(format!("Draft {} does not exist.", index + 1)));
                return;
            }
        };
        self.editor.set_content(&content);
    }

    pub fn handle_clear_drafts(&mut self) {
        match self.drafts.clear_all() {
            Ok(()) => self.notifier.notify(Notice::success("Drafts cleared!")),
            Err(e) => {
                tracing::error!("Error clearing drafts: {}", e);
                self.notifier.notify(Notice::error("Failed to clear drafts."));
            }
        }
    }

    /// `Draft N - <time>` for every stored draft, in the display timezone.
    pub fn draft_labels(&self) -> Vec<String> {
        self.drafts
            .list()
            .iter()
            .enumerate()
            .map(|(i, draft)| format!("Draft {} - {}", i + 1, self.format_timestamp(draft.timestamp)))
            .collect()
    }

    fn format_timestamp(&self, millis: i64) -> String {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(at) => at
                .with_timezone(&self.timezone)
                .format(DRAFT_TIME_FORMAT)
                .to_string(),
            None => millis.to_string(),
        }
    }

    // ---- Google Drive -----------------------------------------------------

    /// Asks the user to grant Drive access.
    pub async fn handle_connect_drive(&mut self) {
        match self.token_service.request_access_token().await {
            Ok(_) => self
                .notifier
                .notify(Notice::success("Connected to Google Drive.")),
            Err(TokenError::NotReady) => self
                .notifier
                .notify(Notice::error("Google API not loaded properly.")),
            Err(TokenError::Grant(_)) => self
                .notifier
                .notify(Notice::error("Google login failed.")),
        }
    }

    pub async fn handle_save_to_drive(&mut self) {
        if self.file_name.trim().is_empty() {
            self.notifier
                .notify(Notice::error("Please enter a file name before saving."));
            return;
        }

        let Some(_loading) = self.loading.begin() else {
            tracing::debug!("Save ignored, another request is in flight");
            return;
        };

        let content = self.editor.get_text();
        match self
            .letter_service
            .save_document(&content, &self.file_name)
            .await
        {
            Ok(saved) => {
                tracing::info!(file_id = %saved.file_id, "Letter saved to Google Drive");
                self.notifier.notify(Notice::success(format!(
                    "\"{}\" saved to Google Drive!",
                    self.file_name
                )));
                self.file_name.clear();
            }
            Err(e) => {
                tracing::error!("Error saving to Google Drive: {}", e);
                self.notifier
                    .notify(Notice::error("Failed to save to Google Drive."));
            }
        }
    }

    pub async fn handle_fetch_letters(&mut self) {
        let Some(_loading) = self.loading.begin() else {
            tracing::debug!("Fetch ignored, another request is in flight");
            return;
        };

        tracing::info!("Fetching letters...");
        self.letters.clear();

        if self.session.token().await.is_none() {
            self.notifier.notify(Notice::error(
                "User not authenticated. Please login with Google.",
            ));
            return;
        }

        match self.letter_service.list_documents().await {
            Ok(letters) => self.letters = letters,
            Err(e) => {
                tracing::error!("Error fetching letters: {}", e);
                self.notifier.notify(Notice::error("Failed to fetch letters."));
            }
        }
    }

    /// `<name> - <link>` for every fetched letter.
    pub fn letter_lines(&self) -> Vec<String> {
        self.letters
            .iter()
            .map(|letter| format!("{} - {}", letter.display_name(), letter.document_url()))
            .collect()
    }

    // ---- rendering --------------------------------------------------------

    pub fn render(&self) -> String {
        let mut out = String::from("Letter Editor\n");
        out.push_str("-------------\n");
        out.push_str(&self.editor.render_ansi());
        out.push('\n');
        out.push_str("-------------\n");

        let file_name = if self.file_name.is_empty() {
            "(none)"
        } else {
            self.file_name.as_str()
        };
        out.push_str(&format!("File name: {}\n", file_name));
        if self.is_loading() {
            out.push_str("Working...\n");
        }

        let drafts = self.draft_labels();
        if !drafts.is_empty() {
            out.push_str("\nSaved Drafts:\n");
            for label in drafts {
                out.push_str(&format!("  {}\n", label));
            }
        }

        let letters = self.letter_lines();
        if !letters.is_empty() {
            out.push_str("\nGoogle Drive Letters:\n");
            for line in letters {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out
    }
}
