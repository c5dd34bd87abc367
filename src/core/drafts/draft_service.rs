use super::draft_models::{Draft, DraftEnvelope, StoredDrafts, DRAFTS_FORMAT_VERSION};
use super::draft_store::{LocalStorage, StorageError};
use chrono::Utc;

/// Storage key holding every draft.
pub const DRAFTS_KEY: &str = "drafts";

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Storage error: {0}")]
    Store(#[from] StorageError),
    #[error("Stored drafts are unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Stored drafts use format version {0}, which this build does not understand")]
    UnsupportedVersion(u32),
    #[error("No draft at position {0}")]
    NotFound(usize),
}

/// Append-only list of drafts backed by local storage.
///
/// Every write rewrites the whole value. The service keeps an in-memory
/// mirror of what it last read or wrote; another process writing the same
/// storage is not noticed until `reload`.
pub struct DraftService {
    storage: Box<dyn LocalStorage>,
    max_drafts: Option<usize>,
    drafts: Vec<Draft>,
}

impl DraftService {
    pub fn new(storage: Box<dyn LocalStorage>, max_drafts: Option<usize>) -> Self {
        let mut service = Self {
            storage,
            max_drafts,
            drafts: Vec::new(),
        };
        if let Err(e) = service.reload() {
            tracing::warn!("Could not read saved drafts, starting empty: {}", e);
        }
        service
    }

    /// Re-reads the persisted drafts into the mirror.
    pub fn reload(&mut self) -> Result<&[Draft], DraftError> {
        self.drafts = self.read_persisted()?;
        Ok(&self.drafts)
    }

    pub fn save(&mut self, content: impl Into<String>) -> Result<Draft, DraftError> {
        let draft = Draft {
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        };

        let mut drafts = self.read_persisted()?;
        drafts.push(draft.clone());

        if let Some(max) = self.max_drafts {
            if drafts.len() > max {
                let dropped = drafts.len() - max;
                drafts.drain(..dropped);
                tracing::warn!(dropped, max, "Draft limit reached, dropping oldest drafts");
            }
        }

        let value = serde_json::to_string(&DraftEnvelope::current(drafts.clone()))?;
        self.storage.set_item(DRAFTS_KEY, &value)?;
        self.drafts = drafts;

        tracing::debug!(count = self.drafts.len(), "Draft saved");
        Ok(draft)
    }

    pub fn list(&self) -> &[Draft] {
        &self.drafts
    }

    /// Returns the draft to put back into the editor. The draft stays stored.
    pub fn load(&self, index: usize) -> Result<&Draft, DraftError> {
        self.drafts.get(index).ok_or(DraftError::NotFound(index))
    }

    /// Removes the key entirely. Calling it on an empty store is fine.
    pub fn clear_all(&mut self) -> Result<(), DraftError> {
        self.storage.remove_item(DRAFTS_KEY)?;
        self.drafts.clear();
        Ok(())
    }

    fn read_persisted(&self) -> Result<Vec<Draft>, DraftError> {
        let Some(raw) = self.storage.get_item(DRAFTS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<StoredDrafts>(&raw)? {
            StoredDrafts::Legacy(drafts) => Ok(drafts),
            StoredDrafts::Versioned(envelope) if envelope.version <= DRAFTS_FORMAT_VERSION => {
                Ok(envelope.drafts)
            }
            StoredDrafts::Versioned(envelope) => {
                Err(DraftError::UnsupportedVersion(envelope.version))
            }
        }
    }
}
