//! Moves sessions in and out of the SQLite store.

use casefile_core::analysis::{DocumentAnalysis, DocumentType};
use casefile_core::chat::ChatTurn;
use casefile_core::{DocumentSession, Services, Span};
use sqlx::SqlitePool;
use storage::models::{Document, Entity, NewDocument, NewEntity};

pub async fn open(database: &str) -> anyhow::Result<SqlitePool> {
    let pool = storage::connect(database).await?;
    storage::migrate(&pool).await?;
    Ok(pool)
}

/// Persists the document, its analysis and its resolved entities.
pub async fn save_session(pool: &SqlitePool, session: &DocumentSession) -> anyhow::Result<i64> {
    let document_type = serde_json::to_string(&session.analysis.document_type)?;
    let key_information = serde_json::Value::Object(session.analysis.key_information.clone());
    let entities: Vec<NewEntity> = session.entities.iter().map(new_entity).collect();
    let id = storage::save_document_with_entities(
        pool,
        NewDocument {
            filename: &session.name,
            document_type: Some(&document_type),
            document_text: &session.text,
            summary: Some(&session.analysis.summary),
            key_information: Some(&key_information),
        },
        &entities,
    )
    .await?;
    Ok(id)
}

/// Rebuilds the session of a stored document, chat history included.
pub async fn load_session(
    pool: &SqlitePool,
    id: i64,
    services: &Services,
) -> anyhow::Result<Option<DocumentSession>> {
    let Some(doc) = storage::get_document(pool, id).await? else {
        return Ok(None);
    };
    let entities = storage::get_entities(pool, id)
        .await?
        .iter()
        .map(span_of)
        .collect();
    // Stored newest first; the session keeps conversation order.
    let history = storage::get_chat_history(pool, id, None)
        .await?
        .into_iter()
        .rev()
        .map(|m| ChatTurn {
            question: m.user_query,
            answer: m.assistant_response,
        })
        .collect();
    let analysis = stored_analysis(&doc);
    let Document {
        filename,
        document_text,
        ..
    } = doc;
    Ok(Some(
        DocumentSession::restore(&filename, document_text, analysis, entities, history, services)
            .await,
    ))
}

pub fn stored_analysis(doc: &Document) -> DocumentAnalysis {
    DocumentAnalysis {
        summary: doc.summary.clone().unwrap_or_default(),
        document_type: stored_document_type(doc.document_type.as_deref()),
        key_information: doc
            .key_information_json()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
    }
}

/// The type column holds the classification as JSON; a bare label from
/// older rows is accepted as-is.
pub fn stored_document_type(raw: Option<&str>) -> DocumentType {
    match raw {
        None => DocumentType::default(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| DocumentType {
            document_type: raw.to_string(),
            explanation: String::new(),
        }),
    }
}

fn new_entity(span: &Span) -> NewEntity {
    NewEntity {
        text: span.text.clone(),
        entity_type: span.entity_type.to_string(),
        start: span.start as i64,
        end: span.end as i64,
    }
}

pub fn span_of(entity: &Entity) -> Span {
    Span::new(
        entity.entity_text.clone(),
        entity.start_pos.max(0) as usize,
        entity.end_pos.max(0) as usize,
        entity.entity_type.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_column_formats() {
        let t = stored_document_type(Some(r#"{"document_type":"NDA","explanation":"secrecy"}"#));
        assert_eq!(t.document_type, "NDA");
        assert_eq!(t.explanation, "secrecy");
        assert_eq!(stored_document_type(Some("Lease")).document_type, "Lease");
        assert_eq!(stored_document_type(None), DocumentType::default());
    }

    #[test]
    fn entity_rows_become_spans() {
        let row = Entity {
            id: 1,
            document_id: 2,
            entity_text: "Roe v. Wade".into(),
            entity_type: "CASE_CITATION".into(),
            start_pos: 4,
            end_pos: 15,
        };
        assert_eq!(span_of(&row), Span::new("Roe v. Wade", 4, 15, "CASE_CITATION"));
    }
}
