use serde::{Deserialize, Serialize};

/// Name of the folder (under the Drive root) that holds every letter.
pub const LETTER_FOLDER_NAME: &str = "Letter";

/// File extension appended to every saved letter name.
pub const LETTER_FILE_EXTENSION: &str = "docx";

/// Position right after the implicit start of a fresh Google Doc.
pub const DOCUMENT_START_INDEX: u32 = 1;

/// A letter as returned by the listing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRef {
    pub id: String,
    pub name: String,
}

impl LetterRef {
    /// Name without a trailing `.ext` (word characters only).
    pub fn display_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot)
                if dot + 1 < self.name.len()
                    && self.name[dot + 1..]
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                &self.name[..dot]
            }
            _ => &self.name,
        }
    }

    pub fn document_url(&self) -> String {
        format!("https://docs.google.com/document/d/{}", self.id)
    }
}

/// Result of a successful remote save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLetter {
    pub file_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(name: &str) -> LetterRef {
        LetterRef {
            id: "doc-1".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn display_name_strips_extension() {
        assert_eq!(letter("cover.docx").display_name(), "cover");
        assert_eq!(letter("v1.2.docx").display_name(), "v1.2");
        assert_eq!(letter("no extension").display_name(), "no extension");
        assert_eq!(letter("trailing.").display_name(), "trailing.");
        assert_eq!(letter("dear sir.final draft").display_name(), "dear sir.final draft");
    }

    #[test]
    fn document_url_points_at_google_docs() {
        assert_eq!(
            letter("a.docx").document_url(),
            "https://docs.google.com/document/d/doc-1"
        );
    }
}
