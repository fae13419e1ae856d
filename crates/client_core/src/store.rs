//! Local document collection kept in step with the remote service.
//!
//! Every mutation is pessimistic: the collection changes only after the
//! service acknowledged the call. Failures leave the collection untouched and
//! land in the [`ErrorReporter`]; the next successful operation clears it.

use std::{future::Future, sync::Arc};

use shared::domain::{Document, DocumentDraft, DocumentId};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{ErrorReporter, StoreError},
    fence::OperationFence,
    DocumentApi,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    DocumentsReplaced(Vec<Document>),
    DocumentCreated(Document),
    DocumentUpdated(Document),
    DocumentDeleted(DocumentId),
    ErrorReported(StoreError),
    ErrorCleared,
}

pub struct DocumentStore {
    api: Arc<dyn DocumentApi>,
    inner: Mutex<StoreState>,
    fence: OperationFence,
    reporter: ErrorReporter,
    events: broadcast::Sender<StoreEvent>,
}

#[derive(Default)]
struct StoreState {
    documents: Vec<Document>,
    issued_list_ticket: u64,
    applied_list_ticket: u64,
}

impl StoreState {
    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| &doc.id == id)
    }
}

impl DocumentStore {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            inner: Mutex::new(StoreState::default()),
            fence: OperationFence::default(),
            reporter: ErrorReporter::new(),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn error_message(&self) -> Option<String> {
        self.reporter.message()
    }

    /// Explicitly dismisses the current error, if any.
    pub fn clear_error(&self) {
        if self.reporter.clear() {
            let _ = self.events.send(StoreEvent::ErrorCleared);
        }
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.inner.lock().await.documents.clone()
    }

    pub async fn document(&self, id: &DocumentId) -> Option<Document> {
        let guard = self.inner.lock().await;
        guard.position(id).map(|idx| guard.documents[idx].clone())
    }

    pub async fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.list_with(&CancellationToken::new()).await
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Document, StoreError> {
        self.create_with(DocumentDraft::new(title, content), &CancellationToken::new())
            .await
    }

    pub async fn update(
        &self,
        id: &DocumentId,
        title: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        self.update_with(
            id,
            DocumentDraft::new(title, content),
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        self.delete_with(id, &CancellationToken::new()).await
    }

    /// Replaces the whole collection with the service's list.
    ///
    /// A response is dropped if a list call issued later has already been
    /// applied. Returns the collection as it stands afterwards.
    pub async fn list_with(&self, cancel: &CancellationToken) -> Result<Vec<Document>, StoreError> {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.issued_list_ticket += 1;
            guard.issued_list_ticket
        };

        let Some(result) = unless_cancelled(cancel, self.api.list()).await else {
            debug!(ticket, "document list cancelled");
            return Err(StoreError::Cancelled);
        };

        let documents = match result {
            Ok(documents) => documents,
            Err(err) => return Err(self.fail(StoreError::Fetch, &err)),
        };

        let current = {
            let mut guard = self.inner.lock().await;
            if ticket < guard.applied_list_ticket {
                debug!(
                    ticket,
                    applied = guard.applied_list_ticket,
                    "discarding stale document list"
                );
            } else {
                guard.applied_list_ticket = ticket;
                guard.documents = documents;
                info!(count = guard.documents.len(), "document list replaced");
                let _ = self
                    .events
                    .send(StoreEvent::DocumentsReplaced(guard.documents.clone()));
            }
            guard.documents.clone()
        };

        self.succeeded();
        Ok(current)
    }

    /// Appends the document once the service returned its id.
    pub async fn create_with(
        &self,
        draft: DocumentDraft,
        cancel: &CancellationToken,
    ) -> Result<Document, StoreError> {
        let Some(result) = unless_cancelled(cancel, self.api.create(&draft)).await else {
            debug!("document create cancelled");
            return Err(StoreError::Cancelled);
        };

        let id = match result {
            Ok(id) => id,
            Err(err) => return Err(self.fail(StoreError::Create, &err)),
        };

        let document = Document::from_draft(id, draft);
        {
            let mut guard = self.inner.lock().await;
            // A list that completed in between may already carry the new id.
            match guard.position(&document.id) {
                Some(idx) => guard.documents[idx] = document.clone(),
                None => guard.documents.push(document.clone()),
            }
        }
        info!(document_id = %document.id, "document created");
        let _ = self
            .events
            .send(StoreEvent::DocumentCreated(document.clone()));

        self.succeeded();
        Ok(document)
    }

    /// Rewrites title and content of the matching local document in place.
    ///
    /// If no local document has `id` the acknowledged update changes nothing
    /// locally.
    pub async fn update_with(
        &self,
        id: &DocumentId,
        draft: DocumentDraft,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let Some(_fence) = unless_cancelled(cancel, self.fence.enter(id)).await else {
            debug!(document_id = %id, "document update cancelled while queued");
            return Err(StoreError::Cancelled);
        };

        let Some(result) = unless_cancelled(cancel, self.api.update(id, &draft)).await else {
            debug!(document_id = %id, "document update cancelled");
            return Err(StoreError::Cancelled);
        };

        if let Err(err) = result {
            return Err(self.fail(StoreError::Update, &err));
        }

        let updated = {
            let mut guard = self.inner.lock().await;
            guard.position(id).map(|idx| {
                let doc = &mut guard.documents[idx];
                doc.title = draft.title;
                doc.content = draft.content;
                doc.clone()
            })
        };

        match updated {
            Some(document) => {
                info!(document_id = %id, "document updated");
                let _ = self.events.send(StoreEvent::DocumentUpdated(document));
            }
            None => warn!(
                document_id = %id,
                "update acknowledged for a document missing from the local collection"
            ),
        }

        self.succeeded();
        Ok(())
    }

    pub async fn delete_with(
        &self,
        id: &DocumentId,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let Some(_fence) = unless_cancelled(cancel, self.fence.enter(id)).await else {
            debug!(document_id = %id, "document delete cancelled while queued");
            return Err(StoreError::Cancelled);
        };

        let Some(result) = unless_cancelled(cancel, self.api.delete(id)).await else {
            debug!(document_id = %id, "document delete cancelled");
            return Err(StoreError::Cancelled);
        };

        if let Err(err) = result {
            return Err(self.fail(StoreError::Delete, &err));
        }

        let removed = {
            let mut guard = self.inner.lock().await;
            guard
                .position(id)
                .map(|idx| guard.documents.remove(idx))
                .is_some()
        };

        if removed {
            info!(document_id = %id, "document deleted");
            let _ = self.events.send(StoreEvent::DocumentDeleted(id.clone()));
        } else {
            debug!(document_id = %id, "delete acknowledged for a document not held locally");
        }

        self.succeeded();
        Ok(())
    }

    /// Refreshes one document from the service, appending it if absent.
    pub async fn reload(&self, id: &DocumentId) -> Result<Document, StoreError> {
        let _fence = self.fence.enter(id).await;

        let document = match self.api.fetch(id).await {
            Ok(document) => document,
            Err(err) => return Err(self.fail(StoreError::Fetch, &err)),
        };

        let replaced = {
            let mut guard = self.inner.lock().await;
            match guard.position(&document.id) {
                Some(idx) => {
                    guard.documents[idx] = document.clone();
                    true
                }
                None => {
                    guard.documents.push(document.clone());
                    false
                }
            }
        };

        debug!(document_id = %document.id, replaced, "document reloaded");
        let event = if replaced {
            StoreEvent::DocumentUpdated(document.clone())
        } else {
            StoreEvent::DocumentCreated(document.clone())
        };
        let _ = self.events.send(event);

        self.succeeded();
        Ok(document)
    }

    fn fail(&self, error: StoreError, cause: &anyhow::Error) -> StoreError {
        warn!(error = %error, cause = %format!("{cause:#}"), "document operation failed");
        self.reporter.report(error);
        let _ = self.events.send(StoreEvent::ErrorReported(error));
        error
    }

    fn succeeded(&self) {
        self.clear_error();
    }
}

/// Drives `fut` unless `cancel` fires first; cancellation drops the future,
/// aborting any request it had in flight.
async fn unless_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
