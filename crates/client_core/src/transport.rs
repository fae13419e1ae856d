//! reqwest implementation of [`DocumentApi`] over the `/api/documents` routes.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Document, DocumentDraft, DocumentId},
    protocol::CreateDocumentResponse,
};
use url::Url;

use crate::DocumentApi;

const API_SEGMENTS: [&str; 2] = ["api", "documents"];

#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    http: Client,
    base_url: Url,
}

impl HttpDocumentApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Requests that take longer than `timeout` fail like any other error.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid server url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            bail!("server url '{base_url}' cannot carry a path");
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self) -> Result<Url> {
        self.url_with(&[])
    }

    fn document_url(&self, id: &DocumentId) -> Result<Url> {
        self.url_with(&[id.as_str()])
    }

    fn url_with(&self, extra: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("server url '{}' cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(API_SEGMENTS)
            .extend(extra);
        Ok(url)
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn list(&self) -> Result<Vec<Document>> {
        let documents = self
            .http
            .get(self.collection_url()?)
            .send()
            .await
            .context("failed to request documents")?
            .error_for_status()?
            .json()
            .await
            .context("malformed document list")?;
        Ok(documents)
    }

    async fn fetch(&self, id: &DocumentId) -> Result<Document> {
        let document = self
            .http
            .get(self.document_url(id)?)
            .send()
            .await
            .with_context(|| format!("failed to request document {id}"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("malformed document {id}"))?;
        Ok(document)
    }

    async fn create(&self, draft: &DocumentDraft) -> Result<DocumentId> {
        let created: CreateDocumentResponse = self
            .http
            .post(self.collection_url()?)
            .json(draft)
            .send()
            .await
            .context("failed to submit new document")?
            .error_for_status()?
            .json()
            .await
            .context("malformed create response")?;
        Ok(created.id)
    }

    async fn update(&self, id: &DocumentId, draft: &DocumentDraft) -> Result<()> {
        self.http
            .put(self.document_url(id)?)
            .json(draft)
            .send()
            .await
            .with_context(|| format!("failed to submit update for document {id}"))?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.http
            .delete(self.document_url(id)?)
            .send()
            .await
            .with_context(|| format!("failed to submit delete for document {id}"))?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
