use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;
use uuid::Uuid;

use shared::domain::{Document, DocumentDraft, DocumentId};

const IN_MEMORY_URL_PREFIX: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredDocument> for Document {
    fn from(value: StoredDocument) -> Self {
        Document {
            id: value.id,
            title: value.title,
            content: value.content,
        }
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty schema,
        // so such pools are pinned to one connection that never expires.
        let pool_options = if database_url.starts_with(IN_MEMORY_URL_PREFIX) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT id, title, content, created_at, updated_at
             FROM documents
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list documents")?;

        rows.into_iter().map(stored_document_from_row).collect()
    }

    pub async fn get_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, title, content, created_at, updated_at FROM documents WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load document {id}"))?;

        row.map(stored_document_from_row).transpose()
    }

    pub async fn insert_document(&self, draft: &DocumentDraft) -> Result<StoredDocument> {
        let id = DocumentId::new(Uuid::new_v4().simple().to_string());
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO documents (id, title, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("failed to insert document")?;

        debug!(document_id = %id, "stored new document");
        Ok(StoredDocument {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns `false` when no document has this id.
    pub async fn update_document(&self, id: &DocumentId, draft: &DocumentDraft) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE documents SET title = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update document {id}"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns `false` when no document has this id.
    pub async fn delete_document(&self, id: &DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete document {id}"))?;
        Ok(result.rows_affected() == 1)
    }
}

fn stored_document_from_row(row: sqlx::sqlite::SqliteRow) -> Result<StoredDocument> {
    Ok(StoredDocument {
        id: DocumentId::new(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(IN_MEMORY_URL_PREFIX) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
