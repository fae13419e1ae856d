//! State machine behind the create/view/edit dialog.
//!
//! `Closed -> Open -> Submitting -> Closed` on success, or back to `Open`
//! with the draft intact when the store call fails. The controller holds a
//! snapshot of the target document, never the store's copy.

use shared::domain::{Document, DocumentDraft, DocumentId, DraftField};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{error::StoreError, store::DocumentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    View,
    Edit,
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModalTarget {
    View(Document),
    Edit(Document),
    Create,
}

impl ModalTarget {
    fn mode(&self) -> ModalMode {
        match self {
            ModalTarget::View(_) => ModalMode::View,
            ModalTarget::Edit(_) => ModalMode::Edit,
            ModalTarget::Create => ModalMode::Create,
        }
    }

    fn document(&self) -> Option<&Document> {
        match self {
            ModalTarget::View(doc) | ModalTarget::Edit(doc) => Some(doc),
            ModalTarget::Create => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ModalSession {
    target: ModalTarget,
    draft: DocumentDraft,
    submit_error: Option<StoreError>,
}

impl ModalSession {
    fn new(target: ModalTarget) -> Self {
        let draft = target
            .document()
            .map(Document::draft)
            .unwrap_or_default();
        Self {
            target,
            draft,
            submit_error: None,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    cancel: CancellationToken,
}

/// What a submit asks the store to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    Create(DocumentDraft),
    Update { id: DocumentId, draft: DocumentDraft },
}

/// A submission handed out by [`ModalController::begin_submit`].
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub ticket: u64,
    pub action: SubmitAction,
    pub cancel: CancellationToken,
}

impl SubmitRequest {
    pub async fn execute(&self, store: &DocumentStore) -> Result<(), StoreError> {
        match &self.action {
            SubmitAction::Create(draft) => store
                .create_with(draft.clone(), &self.cancel)
                .await
                .map(|_| ()),
            SubmitAction::Update { id, draft } => {
                store.update_with(id, draft.clone(), &self.cancel).await
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("no dialog is open")]
    NotOpen,
    #[error("a document opened for viewing cannot be submitted")]
    ViewOnly,
    #[error("a submission is already in progress")]
    InFlight,
    #[error("{} is required", .0.name())]
    MissingField(DraftField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The store acknowledged the change; the dialog closed.
    Saved,
    /// The store call failed; the dialog is open again with the same draft.
    Failed(StoreError),
    /// The submission was cancelled; the dialog is open again.
    Cancelled,
    /// The dialog moved on (closed or reopened) before the call resolved.
    Superseded,
}

#[derive(Debug, Default)]
pub struct ModalController {
    session: Option<ModalSession>,
    in_flight: Option<InFlight>,
    last_ticket: u64,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ModalPhase {
        match (&self.session, &self.in_flight) {
            (None, _) => ModalPhase::Closed,
            (Some(_), Some(_)) => ModalPhase::Submitting,
            (Some(_), None) => ModalPhase::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<ModalMode> {
        self.session.as_ref().map(|session| session.target.mode())
    }

    pub fn target(&self) -> Option<&Document> {
        self.session
            .as_ref()
            .and_then(|session| session.target.document())
    }

    pub fn draft_title(&self) -> &str {
        self.session
            .as_ref()
            .map_or("", |session| session.draft.title.as_str())
    }

    pub fn draft_content(&self) -> &str {
        self.session
            .as_ref()
            .map_or("", |session| session.draft.content.as_str())
    }

    /// Failure of the last submit, kept until the draft is submitted again.
    pub fn submit_error(&self) -> Option<StoreError> {
        self.session.as_ref().and_then(|session| session.submit_error)
    }

    pub fn open_view(&mut self, doc: Document) {
        self.open(ModalTarget::View(doc));
    }

    pub fn open_edit(&mut self, doc: Document) {
        self.open(ModalTarget::Edit(doc));
    }

    pub fn open_create(&mut self) {
        self.open(ModalTarget::Create);
    }

    /// Closes from any state, cancelling a submission in flight.
    pub fn close(&mut self) {
        self.cancel_in_flight();
        if self.session.take().is_some() {
            debug!("modal closed");
        }
    }

    /// Returns `false` when the dialog is not accepting edits.
    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        match self.editable_draft() {
            Some(draft) => {
                draft.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Returns `false` when the dialog is not accepting edits.
    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        match self.editable_draft() {
            Some(draft) => {
                draft.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Validates the draft and moves to `Submitting`.
    ///
    /// Rejections leave the state unchanged and never reach the store.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitRejected> {
        if self.in_flight.is_some() {
            return Err(SubmitRejected::InFlight);
        }
        let session = self.session.as_mut().ok_or(SubmitRejected::NotOpen)?;
        let action = match &session.target {
            ModalTarget::View(_) => return Err(SubmitRejected::ViewOnly),
            ModalTarget::Edit(doc) => SubmitAction::Update {
                id: doc.id.clone(),
                draft: session.draft.clone(),
            },
            ModalTarget::Create => SubmitAction::Create(session.draft.clone()),
        };
        if let Some(field) = session.draft.missing_field() {
            return Err(SubmitRejected::MissingField(field));
        }
        session.submit_error = None;

        self.last_ticket += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            ticket: self.last_ticket,
            cancel: cancel.clone(),
        });
        debug!(ticket = self.last_ticket, "modal submitting");

        Ok(SubmitRequest {
            ticket: self.last_ticket,
            action,
            cancel,
        })
    }

    /// Applies the result of the submission identified by `ticket`.
    pub fn complete_submit(
        &mut self,
        ticket: u64,
        outcome: Result<(), StoreError>,
    ) -> SubmitOutcome {
        if self.in_flight.as_ref().map(|flight| flight.ticket) != Some(ticket) {
            debug!(ticket, "ignoring completion of a superseded submission");
            return SubmitOutcome::Superseded;
        }
        self.in_flight = None;

        match outcome {
            Ok(()) => {
                self.session = None;
                debug!(ticket, "modal submission saved");
                SubmitOutcome::Saved
            }
            Err(StoreError::Cancelled) => SubmitOutcome::Cancelled,
            Err(error) => {
                if let Some(session) = self.session.as_mut() {
                    session.submit_error = Some(error);
                }
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Stops waiting for the submission in flight and reopens the draft.
    pub fn cancel_submit(&mut self) -> bool {
        self.cancel_in_flight()
    }

    /// Submits the draft and waits for the store to resolve it.
    pub async fn submit(
        &mut self,
        store: &DocumentStore,
    ) -> Result<SubmitOutcome, SubmitRejected> {
        let request = self.begin_submit()?;
        let outcome = request.execute(store).await;
        Ok(self.complete_submit(request.ticket, outcome))
    }

    fn open(&mut self, target: ModalTarget) {
        self.cancel_in_flight();
        debug!(mode = ?target.mode(), "modal opened");
        self.session = Some(ModalSession::new(target));
    }

    fn editable_draft(&mut self) -> Option<&mut DocumentDraft> {
        if self.in_flight.is_some() {
            return None;
        }
        self.session
            .as_mut()
            .filter(|session| session.target.mode() != ModalMode::View)
            .map(|session| &mut session.draft)
    }

    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                flight.cancel.cancel();
                debug!(ticket = flight.ticket, "modal submission cancelled");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/modal_tests.rs"]
mod tests;
