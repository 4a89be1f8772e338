//! Document store: named collections of schemaless JSON documents.
//!
//! Documents carry no cross-references the store knows about and no write
//! spans more than one document. Callers validate shape before writing.

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "stories")]
    Stories,
    #[serde(rename = "blogPosts")]
    BlogPosts,
    #[serde(rename = "contactSubmissions")]
    ContactSubmissions,
    #[serde(rename = "invoices")]
    Invoices,
    #[serde(rename = "settings")]
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Stories,
        Collection::BlogPosts,
        Collection::ContactSubmissions,
        Collection::Invoices,
        Collection::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Stories => "stories",
            Collection::BlogPosts => "blogPosts",
            Collection::ContactSubmissions => "contactSubmissions",
            Collection::Invoices => "invoices",
            Collection::Settings => "settings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document data must be a JSON object")]
    NotAnObject,

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub collection: Collection,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Typed view of the document. Unknown fields in `data` are ignored.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<Record<T>, StoreError> {
        Ok(Record {
            data: serde_json::from_value(self.data)?,
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A document decoded into `T`, serialized flat (`{ id, ...data, createdAt }`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store `data` under a freshly generated id.
    async fn insert(&self, collection: Collection, data: Value) -> Result<Document, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Newest document whose top-level string `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// All documents of a collection, newest first.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Overwrite a document's data. `None` when the document does not exist.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Upsert with a shallow merge: top-level keys in `data` win, other
    /// existing keys are kept.
    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Document, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

/// Serialize a model into document data, rejecting non-object payloads.
pub fn to_data<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    let data = serde_json::to_value(value)?;
    ensure_object(&data)?;
    Ok(data)
}

pub(crate) fn ensure_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}

/// Decode every document of a collection, skipping (and logging) documents
/// that no longer match `T`.
pub async fn list_records<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> Result<Vec<Record<T>>, StoreError> {
    let docs = store.list(collection).await?;
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        let id = doc.id.clone();
        match doc.into_record() {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(%collection, %id, error = %e, "skipping malformed document"),
        }
    }
    Ok(records)
}

pub async fn get_record<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<Option<Record<T>>, StoreError> {
    store
        .get(collection, id)
        .await?
        .map(Document::into_record)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        title: String,
    }

    #[test]
    fn test_collection_names() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Some(collection));
            assert_eq!(
                serde_json::to_value(collection).unwrap(),
                json!(collection.as_str())
            );
        }
        assert_eq!(Collection::parse("users"), None);
    }

    #[test]
    fn test_record_serializes_flat() {
        let doc = Document {
            id: "abc".into(),
            collection: Collection::Stories,
            data: json!({"title": "Hello", "extra": 1}),
            created_at: Utc::now(),
            updated_at: None,
        };
        let record: Record<Note> = doc.into_record().unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["title"], "Hello");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_to_data_rejects_non_objects() {
        assert!(to_data(&Note { title: "x".into() }).is_ok());
        assert!(matches!(to_data(&vec![1, 2]), Err(StoreError::NotAnObject)));
    }

    #[tokio::test]
    async fn test_list_records_skips_malformed() {
        let store = MemoryDocumentStore::new();
        store
            .insert(Collection::Stories, json!({"title": "Good"}))
            .await
            .unwrap();
        store
            .insert(Collection::Stories, json!({"title": 42}))
            .await
            .unwrap();

        let records: Vec<Record<Note>> = list_records(&store, Collection::Stories).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data.title, "Good");
    }
}
