use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{Document, DocumentDraft, DocumentId};

pub mod error;
mod fence;
pub mod modal;
pub mod page;
pub mod store;
pub mod transport;

pub use error::{ErrorReporter, StoreError};
pub use modal::{
    ModalController, ModalMode, ModalPhase, SubmitAction, SubmitOutcome, SubmitRejected,
    SubmitRequest,
};
pub use page::{DocumentPreview, DocumentsPage, PageAction, PageError};
pub use store::{DocumentStore, StoreEvent};
pub use transport::HttpDocumentApi;

/// Remote CRUD service holding the canonical documents.
///
/// Any error means the operation did not take effect as far as the caller
/// can tell; implementations do not distinguish causes.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Document>>;
    async fn fetch(&self, id: &DocumentId) -> Result<Document>;
    /// Returns the id assigned by the service.
    async fn create(&self, draft: &DocumentDraft) -> Result<DocumentId>;
    async fn update(&self, id: &DocumentId, draft: &DocumentDraft) -> Result<()>;
    async fn delete(&self, id: &DocumentId) -> Result<()>;
}

pub struct MissingDocumentApi;

#[async_trait]
impl DocumentApi for MissingDocumentApi {
    async fn list(&self) -> Result<Vec<Document>> {
        Err(anyhow!("document service is unavailable"))
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Document> {
        Err(anyhow!("document service is unavailable for document {id}"))
    }

    async fn create(&self, _draft: &DocumentDraft) -> Result<DocumentId> {
        Err(anyhow!("document service is unavailable"))
    }

    async fn update(&self, id: &DocumentId, _draft: &DocumentDraft) -> Result<()> {
        Err(anyhow!("document service is unavailable for document {id}"))
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        Err(anyhow!("document service is unavailable for document {id}"))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
