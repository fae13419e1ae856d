use shared::domain::{Document, DocumentDraft};
use storage::Storage;

#[tokio::test]
async fn create_update_delete_round_trip_through_sqlite() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let stored = storage
        .insert_document(&DocumentDraft::new("Plan", "Buy milk"))
        .await
        .expect("insert");
    let listed: Vec<Document> = storage
        .list_documents()
        .await
        .expect("list")
        .into_iter()
        .map(Document::from)
        .collect();
    assert_eq!(
        listed,
        vec![Document {
            id: stored.id.clone(),
            title: "Plan".into(),
            content: "Buy milk".into(),
        }]
    );

    assert!(storage
        .update_document(&stored.id, &DocumentDraft::new("Plan v2", "Buy milk and eggs"))
        .await
        .expect("update"));
    let updated = storage
        .get_document(&stored.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(updated.title, "Plan v2");
    assert_eq!(updated.content, "Buy milk and eggs");

    assert!(storage.delete_document(&stored.id).await.expect("delete"));
    assert!(storage.list_documents().await.expect("list").is_empty());
}
