use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned document identifier. Opaque to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
}

impl Document {
    pub fn from_draft(id: DocumentId, draft: DocumentDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
        }
    }

    pub fn draft(&self) -> DocumentDraft {
        DocumentDraft {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Content,
}

impl DraftField {
    pub fn name(self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Content => "content",
        }
    }
}

/// Title and content as typed by a user, before the server assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub content: String,
}

impl DocumentDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// First required field left empty, title before content.
    ///
    /// Only presence is checked: a whitespace-only title is accepted.
    pub fn missing_field(&self) -> Option<DraftField> {
        if self.title.is_empty() {
            Some(DraftField::Title)
        } else if self.content.is_empty() {
            Some(DraftField::Content)
        } else {
            None
        }
    }
}
