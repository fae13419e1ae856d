use shared::{
    domain::{Document, DocumentDraft, DocumentId},
    error::{ApiError, ErrorCode},
    protocol::{CreateDocumentResponse, MessageResponse},
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_documents(ctx: &ApiContext) -> Result<Vec<Document>, ApiError> {
    let documents = ctx.storage.list_documents().await.map_err(internal)?;
    Ok(documents.into_iter().map(Document::from).collect())
}

pub async fn get_document(ctx: &ApiContext, id: &DocumentId) -> Result<Document, ApiError> {
    ctx.storage
        .get_document(id)
        .await
        .map_err(internal)?
        .map(Document::from)
        .ok_or_else(|| not_found(id))
}

pub async fn create_document(
    ctx: &ApiContext,
    draft: DocumentDraft,
) -> Result<CreateDocumentResponse, ApiError> {
    ensure_complete(&draft)?;
    let stored = ctx
        .storage
        .insert_document(&draft)
        .await
        .map_err(internal)?;
    info!(document_id = %stored.id, "document created");
    Ok(Document::from(stored).into())
}

pub async fn update_document(
    ctx: &ApiContext,
    id: &DocumentId,
    draft: DocumentDraft,
) -> Result<MessageResponse, ApiError> {
    ensure_complete(&draft)?;
    let matched = ctx
        .storage
        .update_document(id, &draft)
        .await
        .map_err(internal)?;
    if !matched {
        return Err(not_found(id));
    }
    info!(document_id = %id, "document updated");
    Ok(MessageResponse::new("document updated"))
}

pub async fn delete_document(
    ctx: &ApiContext,
    id: &DocumentId,
) -> Result<MessageResponse, ApiError> {
    let removed = ctx.storage.delete_document(id).await.map_err(internal)?;
    if !removed {
        return Err(not_found(id));
    }
    info!(document_id = %id, "document deleted");
    Ok(MessageResponse::new("document deleted"))
}

fn ensure_complete(draft: &DocumentDraft) -> Result<(), ApiError> {
    match draft.missing_field() {
        Some(field) => Err(ApiError::validation(format!(
            "{} must not be empty",
            field.name()
        ))),
        None => Ok(()),
    }
}

fn not_found(id: &DocumentId) -> ApiError {
    ApiError::not_found(format!("document {id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_without_storing() {
        let ctx = setup().await;
        let err = create_document(&ctx, DocumentDraft::new("", "body"))
            .await
            .expect_err("should fail");
        assert!(matches!(err.code, ErrorCode::Validation));
        assert!(err.message.contains("title"));

        let err = create_document(&ctx, DocumentDraft::new("title", ""))
            .await
            .expect_err("should fail");
        assert!(err.message.contains("content"));

        assert!(list_documents(&ctx).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_echoes_server_assigned_id() {
        let ctx = setup().await;
        let created = create_document(&ctx, DocumentDraft::new("Plan", "Buy milk"))
            .await
            .expect("create");
        let fetched = get_document(&ctx, &created.id).await.expect("get");
        assert_eq!(fetched.title, "Plan");
        assert_eq!(created.title.as_deref(), Some("Plan"));
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_id_are_not_found() {
        let ctx = setup().await;
        let ghost = DocumentId::new("ghost");
        let err = update_document(&ctx, &ghost, DocumentDraft::new("t", "c"))
            .await
            .expect_err("should fail");
        assert!(matches!(err.code, ErrorCode::NotFound));

        let err = delete_document(&ctx, &ghost)
            .await
            .expect_err("should fail");
        assert!(matches!(err.code, ErrorCode::NotFound));

        let err = get_document(&ctx, &ghost).await.expect_err("should fail");
        assert!(matches!(err.code, ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn update_with_identical_content_still_succeeds() {
        let ctx = setup().await;
        let created = create_document(&ctx, DocumentDraft::new("same", "same"))
            .await
            .expect("create");
        update_document(&ctx, &created.id, DocumentDraft::new("same", "same"))
            .await
            .expect("update");
    }
}
