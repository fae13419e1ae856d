//! Scripted in-memory document service for store, modal and page tests.

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{Document, DocumentDraft, DocumentId};
use tokio::sync::Mutex;

use crate::DocumentApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct FakeState {
    documents: Vec<Document>,
    next_id: u64,
    failing: HashSet<Op>,
    delays: VecDeque<Duration>,
    response_delays: VecDeque<Duration>,
    calls: Vec<(Op, Option<DocumentId>)>,
}

/// Applies each call when it completes, so artificial delays reorder effects
/// the same way a slow network would.
#[derive(Clone, Default)]
pub(crate) struct FakeDocumentApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDocumentApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn with_documents(documents: Vec<Document>) -> Self {
        let api = Self::new();
        api.state.lock().await.documents = documents;
        api
    }

    pub(crate) async fn set_failing(&self, op: Op, failing: bool) {
        let mut state = self.state.lock().await;
        if failing {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// Delays for upcoming calls, consumed in call order.
    pub(crate) async fn push_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().await.delays.extend(delays);
    }

    /// Delays between a create taking effect on the server and its answer.
    pub(crate) async fn push_response_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().await.response_delays.extend(delays);
    }

    pub(crate) async fn server_documents(&self) -> Vec<Document> {
        self.state.lock().await.documents.clone()
    }

    pub(crate) async fn calls(&self) -> Vec<(Op, Option<DocumentId>)> {
        self.state.lock().await.calls.clone()
    }

    async fn begin(&self, op: Op, id: Option<&DocumentId>) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls.push((op, id.cloned()));
            state.delays.pop_front()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.lock().await.failing.contains(&op) {
            return Err(anyhow!("scripted {op:?} failure"));
        }
        Ok(())
    }

    async fn respond<T>(&self, result: Result<T>) -> Result<T> {
        let delay = self.state.lock().await.response_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl DocumentApi for FakeDocumentApi {
    async fn list(&self) -> Result<Vec<Document>> {
        self.begin(Op::List, None).await?;
        Ok(self.state.lock().await.documents.clone())
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Document> {
        self.begin(Op::Fetch, Some(id)).await?;
        let state = self.state.lock().await;
        state
            .documents
            .iter()
            .find(|doc| &doc.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {id}"))
    }

    async fn create(&self, draft: &DocumentDraft) -> Result<DocumentId> {
        self.begin(Op::Create, None).await?;
        let id = {
            let mut state = self.state.lock().await;
            state.next_id += 1;
            let id = DocumentId::new(format!("d{}", state.next_id));
            state
                .documents
                .push(Document::from_draft(id.clone(), draft.clone()));
            id
        };
        self.respond(Ok(id)).await
    }

    async fn update(&self, id: &DocumentId, draft: &DocumentDraft) -> Result<()> {
        self.begin(Op::Update, Some(id)).await?;
        let mut state = self.state.lock().await;
        let doc = state
            .documents
            .iter_mut()
            .find(|doc| &doc.id == id)
            .ok_or_else(|| anyhow!("404 for {id}"))?;
        doc.title = draft.title.clone();
        doc.content = draft.content.clone();
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.begin(Op::Delete, Some(id)).await?;
        let mut state = self.state.lock().await;
        let idx = state
            .documents
            .iter()
            .position(|doc| &doc.id == id)
            .ok_or_else(|| anyhow!("404 for {id}"))?;
        state.documents.remove(idx);
        Ok(())
    }
}

pub(crate) fn doc(id: &str, title: &str, content: &str) -> Document {
    Document {
        id: DocumentId::new(id),
        title: title.to_string(),
        content: content.to_string(),
    }
}
