use serde::{Deserialize, Serialize};

/// Current on-disk format of the drafts value.
pub const DRAFTS_FORMAT_VERSION: u32 = 1;

/// A locally saved snapshot of the editor content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Serialized rich text (HTML).
    pub content: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Versioned wrapper persisted under the `drafts` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEnvelope {
    pub version: u32,
    #[serde(default)]
    pub drafts: Vec<Draft>,
}

impl DraftEnvelope {
    pub fn current(drafts: Vec<Draft>) -> Self {
        Self {
            version: DRAFTS_FORMAT_VERSION,
            drafts,
        }
    }
}

/// Everything we accept when reading the `drafts` key. Older builds wrote a
/// bare array; those are migrated into an envelope on the next write.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoredDrafts {
    Legacy(Vec<Draft>),
    Versioned(DraftEnvelope),
}
