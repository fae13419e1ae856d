//! JSON bodies exchanged on `/api/documents`.

use serde::{Deserialize, Serialize};

use crate::domain::{Document, DocumentId};

pub const DOCUMENTS_ROUTE: &str = "/api/documents";
/// Router pattern for a single document.
pub const DOCUMENT_ROUTE: &str = "/api/documents/:document_id";

pub fn document_route(id: &DocumentId) -> String {
    format!("{DOCUMENTS_ROUTE}/{}", id.as_str())
}

/// Body returned by `POST /api/documents`.
///
/// Clients only rely on `id`; the echoed fields are optional so that a
/// service answering with a bare `{ "id": ... }` is still understood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<Document> for CreateDocumentResponse {
    fn from(value: Document) -> Self {
        Self {
            id: value.id,
            title: Some(value.title),
            content: Some(value.content),
        }
    }
}

/// Acknowledgement body of update and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_accepts_bare_id() {
        let parsed: CreateDocumentResponse =
            serde_json::from_str(r#"{"id":"65f0c0ffee"}"#).expect("json");
        assert_eq!(parsed.id, DocumentId::new("65f0c0ffee"));
        assert!(parsed.title.is_none());
    }

    #[test]
    fn document_route_appends_id() {
        assert_eq!(
            document_route(&DocumentId::new("d1")),
            "/api/documents/d1"
        );
    }
}
