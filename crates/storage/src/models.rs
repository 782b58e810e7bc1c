use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub document_type: Option<String>,
    pub upload_date: i64,
    pub document_text: String,
    pub summary: Option<String>,
    /// Raw JSON object.
    pub key_information: Option<String>,
}

impl Document {
    pub fn key_information_json(&self) -> Option<serde_json::Value> {
        self.key_information
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Listing row without the document body.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentListing {
    pub id: i64,
    pub filename: String,
    pub document_type: Option<String>,
    pub upload_date: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub document_id: i64,
    pub entity_text: String,
    pub entity_type: String,
    pub start_pos: i64,
    pub end_pos: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub document_id: i64,
    pub user_query: String,
    pub assistant_response: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub filename: &'a str,
    pub document_type: Option<&'a str>,
    pub document_text: &'a str,
    pub summary: Option<&'a str>,
    pub key_information: Option<&'a serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    pub text: String,
    pub entity_type: String,
    pub start: i64,
    pub end: i64,
}
