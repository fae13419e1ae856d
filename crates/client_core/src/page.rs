//! Page-level state container: the document store plus the dialog, driven
//! through [`PageAction`]s.

use std::sync::Arc;

use shared::domain::{Document, DocumentId};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::StoreError,
    modal::{ModalController, SubmitOutcome, SubmitRejected},
    store::DocumentStore,
};

/// Characters of content shown in the list before it is cut off.
pub const PREVIEW_MAX_CHARS: usize = 100;
const PREVIEW_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Load,
    OpenCreate,
    OpenView(DocumentId),
    OpenEdit(DocumentId),
    EditTitle(String),
    EditContent(String),
    Submit,
    Close,
    Delete(DocumentId),
    DismissError,
}

impl PageAction {
    pub fn name(&self) -> &'static str {
        match self {
            PageAction::Load => "load",
            PageAction::OpenCreate => "open_create",
            PageAction::OpenView(_) => "open_view",
            PageAction::OpenEdit(_) => "open_edit",
            PageAction::EditTitle(_) => "edit_title",
            PageAction::EditContent(_) => "edit_content",
            PageAction::Submit => "submit",
            PageAction::Close => "close",
            PageAction::Delete(_) => "delete",
            PageAction::DismissError => "dismiss_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("document {0} is not loaded")]
    UnknownDocument(DocumentId),
    #[error("the dialog is not accepting edits")]
    NotEditable,
    #[error(transparent)]
    Submit(#[from] SubmitRejected),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPreview {
    pub id: DocumentId,
    pub title: String,
    pub excerpt: String,
}

impl DocumentPreview {
    pub fn of(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            excerpt: excerpt(&doc.content),
        }
    }
}

/// Content cut to [`PREVIEW_MAX_CHARS`] characters, with `...` when cut.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}{PREVIEW_ELLIPSIS}", &content[..cut]),
        None => content.to_string(),
    }
}

pub struct DocumentsPage {
    store: Arc<DocumentStore>,
    modal: ModalController,
}

impl DocumentsPage {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            modal: ModalController::new(),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.store.documents().await
    }

    pub async fn previews(&self) -> Vec<DocumentPreview> {
        self.store
            .documents()
            .await
            .iter()
            .map(DocumentPreview::of)
            .collect()
    }

    pub fn error_message(&self) -> Option<String> {
        self.store.error_message()
    }

    pub async fn dispatch(&mut self, action: PageAction) -> Result<(), PageError> {
        debug!(action = action.name(), "dispatching page action");
        match action {
            PageAction::Load => {
                self.store.list().await?;
            }
            PageAction::OpenCreate => self.modal.open_create(),
            PageAction::OpenView(id) => {
                let doc = self.loaded(id).await?;
                self.modal.open_view(doc);
            }
            PageAction::OpenEdit(id) => {
                let doc = self.loaded(id).await?;
                self.modal.open_edit(doc);
            }
            PageAction::EditTitle(title) => {
                if !self.modal.set_title(title) {
                    return Err(PageError::NotEditable);
                }
            }
            PageAction::EditContent(content) => {
                if !self.modal.set_content(content) {
                    return Err(PageError::NotEditable);
                }
            }
            PageAction::Submit => match self.modal.submit(&self.store).await? {
                SubmitOutcome::Failed(error) => return Err(error.into()),
                SubmitOutcome::Saved | SubmitOutcome::Cancelled | SubmitOutcome::Superseded => {}
            },
            PageAction::Close => self.modal.close(),
            PageAction::Delete(id) => {
                self.store.delete(&id).await?;
                // The dialog must not keep showing or editing a deleted document.
                if self.modal.target().is_some_and(|doc| doc.id == id) {
                    self.modal.close();
                }
            }
            PageAction::DismissError => self.store.clear_error(),
        }
        Ok(())
    }

    async fn loaded(&self, id: DocumentId) -> Result<Document, PageError> {
        self.store
            .document(&id)
            .await
            .ok_or(PageError::UnknownDocument(id))
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
