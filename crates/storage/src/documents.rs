use crate::models::{ChatMessage, Document, DocumentListing, Entity, NewDocument, NewEntity};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

/// Default page size of listings and chat history.
pub const DEFAULT_LIMIT: u32 = 10;

/// `LIMIT -1` is unbounded in SQLite.
fn limit_value(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

pub async fn save_document(pool: &SqlitePool, doc: NewDocument<'_>) -> anyhow::Result<i64> {
    let mut conn = pool.acquire().await?;
    insert_document(&mut *conn, doc).await
}

/// Stores a document and its entities in one transaction.
pub async fn save_document_with_entities(
    pool: &SqlitePool,
    doc: NewDocument<'_>,
    entities: &[NewEntity],
) -> anyhow::Result<i64> {
    let mut tx = pool.begin().await?;
    let id = insert_document(&mut *tx, doc).await?;
    replace_entities(&mut *tx, id, entities).await?;
    tx.commit().await?;
    Ok(id)
}

async fn insert_document(
    conn: &mut SqliteConnection,
    doc: NewDocument<'_>,
) -> anyhow::Result<i64> {
    let key_info = doc.key_information.map(|v| v.to_string());
    let res = sqlx::query(
        r#"
        INSERT INTO documents (filename, document_type, upload_date, document_text, summary, key_information)
        VALUES (?1, ?2, strftime('%s','now'), ?3, ?4, ?5)
        "#,
    )
    .bind(doc.filename)
    .bind(doc.document_type)
    .bind(doc.document_text)
    .bind(doc.summary)
    .bind(key_info)
    .execute(&mut *conn)
    .await?;
    let id = res.last_insert_rowid();
    debug!(id, filename = doc.filename, "saved document");
    Ok(id)
}

/// Replaces the stored entity set of a document.
pub async fn save_entities(
    pool: &SqlitePool,
    document_id: i64,
    entities: &[NewEntity],
) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    replace_entities(&mut *tx, document_id, entities).await?;
    tx.commit().await?;
    Ok(entities.len())
}

async fn replace_entities(
    conn: &mut SqliteConnection,
    document_id: i64,
    entities: &[NewEntity],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM entities WHERE document_id = ?1")
        .bind(document_id)
        .execute(&mut *conn)
        .await?;
    for entity in entities {
        sqlx::query(
            r#"
            INSERT INTO entities (document_id, entity_text, entity_type, start_pos, end_pos)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(document_id)
        .bind(&entity.text)
        .bind(&entity.entity_type)
        .bind(entity.start)
        .bind(entity.end)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Newest first; `None` lists everything.
pub async fn list_documents(
    pool: &SqlitePool,
    limit: Option<u32>,
) -> anyhow::Result<Vec<DocumentListing>> {
    let rows = sqlx::query_as::<_, DocumentListing>(
        r#"
        SELECT id, filename, document_type, upload_date FROM documents
        ORDER BY upload_date DESC, id DESC
        LIMIT ?1
        "#,
    )
    .bind(limit_value(limit))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_document(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<Document>> {
    let row = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_entities(pool: &SqlitePool, document_id: i64) -> anyhow::Result<Vec<Entity>> {
    let rows = sqlx::query_as::<_, Entity>(
        "SELECT * FROM entities WHERE document_id = ?1 ORDER BY start_pos, id",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn save_chat_message(
    pool: &SqlitePool,
    document_id: i64,
    user_query: &str,
    assistant_response: &str,
) -> anyhow::Result<i64> {
    let res = sqlx::query(
        r#"
        INSERT INTO chat_history (document_id, user_query, assistant_response, timestamp)
        VALUES (?1, ?2, ?3, strftime('%s','now'))
        "#,
    )
    .bind(document_id)
    .bind(user_query)
    .bind(assistant_response)
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

/// Most recent exchanges first; `None` returns the whole conversation.
pub async fn get_chat_history(
    pool: &SqlitePool,
    document_id: i64,
    limit: Option<u32>,
) -> anyhow::Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT * FROM chat_history WHERE document_id = ?1
        ORDER BY timestamp DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(document_id)
    .bind(limit_value(limit))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes a document with its entities and chat history. Returns whether it existed.
pub async fn delete_document(pool: &SqlitePool, id: i64) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM entities WHERE document_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chat_history WHERE document_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let res = sqlx::query("DELETE FROM documents WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect, migrate};

    async fn setup() -> (tempfile::TempDir, SqlitePool) {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("test.db");
        let pool = connect(&db_path.to_string_lossy()).await.unwrap();
        migrate(&pool).await.unwrap();
        (temp, pool)
    }

    #[tokio::test]
    async fn document_round_trip_with_entities_and_chat() {
        let (_temp, pool) = setup().await;
        let key_info = serde_json::json!({ "parties": "Acme and Beta" });
        let id = save_document(
            &pool,
            NewDocument {
                filename: "lease.txt",
                document_type: Some("Lease"),
                document_text: "This lease is made between Acme and Beta.",
                summary: Some("A lease."),
                key_information: Some(&key_info),
            },
        )
        .await
        .unwrap();

        let doc = get_document(&pool, id).await.unwrap().unwrap();
        assert_eq!(doc.filename, "lease.txt");
        assert_eq!(doc.key_information_json(), Some(key_info));

        let entities = vec![
            NewEntity {
                text: "Beta".into(),
                entity_type: "PARTY".into(),
                start: 36,
                end: 40,
            },
            NewEntity {
                text: "Acme".into(),
                entity_type: "PARTY".into(),
                start: 27,
                end: 31,
            },
        ];
        assert_eq!(save_entities(&pool, id, &entities).await.unwrap(), 2);
        let stored = get_entities(&pool, id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].entity_text, "Acme");

        // Saving again replaces the set.
        save_entities(&pool, id, &entities[..1]).await.unwrap();
        assert_eq!(get_entities(&pool, id).await.unwrap().len(), 1);

        save_chat_message(&pool, id, "Who are the parties?", "Acme and Beta.")
            .await
            .unwrap();
        let history = get_chat_history(&pool, id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].assistant_response, "Acme and Beta.");

        assert_eq!(list_documents(&pool, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_children() {
        let (_temp, pool) = setup().await;
        let id = save_document(
            &pool,
            NewDocument {
                filename: "nda.txt",
                document_type: None,
                document_text: "text",
                summary: None,
                key_information: None,
            },
        )
        .await
        .unwrap();
        save_entities(
            &pool,
            id,
            &[NewEntity {
                text: "text".into(),
                entity_type: "LEGAL_TERM".into(),
                start: 0,
                end: 4,
            }],
        )
        .await
        .unwrap();
        save_chat_message(&pool, id, "q", "a").await.unwrap();

        assert!(delete_document(&pool, id).await.unwrap());
        assert!(get_document(&pool, id).await.unwrap().is_none());
        assert!(get_entities(&pool, id).await.unwrap().is_empty());
        assert!(get_chat_history(&pool, id, None).await.unwrap().is_empty());
        assert!(!delete_document(&pool, id).await.unwrap());
    }

    fn doc(filename: &str) -> NewDocument<'_> {
        NewDocument {
            filename,
            document_type: None,
            document_text: "text",
            summary: None,
            key_information: None,
        }
    }

    #[tokio::test]
    async fn listing_and_history_are_newest_first_and_limited() {
        let (_temp, pool) = setup().await;
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(save_document(&pool, doc(&format!("doc{i}.txt"))).await.unwrap());
        }
        let listed = list_documents(&pool, Some(DEFAULT_LIMIT)).await.unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0].filename, "doc11.txt");
        assert_eq!(list_documents(&pool, None).await.unwrap().len(), 12);

        let id = ids[0];
        for i in 0..3 {
            save_chat_message(&pool, id, &format!("q{i}"), "a").await.unwrap();
        }
        let recent = get_chat_history(&pool, id, Some(2)).await.unwrap();
        let queries: Vec<&str> = recent.iter().map(|m| m.user_query.as_str()).collect();
        assert_eq!(queries, vec!["q2", "q1"]);
        assert_eq!(get_chat_history(&pool, id, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_entity_insert_leaves_no_document() {
        let (_temp, pool) = setup().await;
        sqlx::query("DROP TABLE entities").execute(&pool).await.unwrap();
        let entity = NewEntity {
            text: "text".into(),
            entity_type: "LEGAL_TERM".into(),
            start: 0,
            end: 4,
        };
        let result = save_document_with_entities(&pool, doc("orphan.txt"), &[entity]).await;
        assert!(result.is_err());
        assert!(list_documents(&pool, None).await.unwrap().is_empty());
    }
}
