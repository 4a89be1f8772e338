use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ensure_object, Collection, Document, DocumentStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    doc: Document,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<(Collection, String), Entry>,
    next_seq: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Documents of one collection, newest first. Insertion order breaks
    /// timestamp ties.
    fn sorted(&self, collection: Collection) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self
            .docs
            .values()
            .filter(|e| e.doc.collection == collection)
            .collect();
        entries.sort_by(|a, b| {
            b.doc
                .created_at
                .cmp(&a.doc.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries
    }
}

/// In-process document store for tests and databaseless development.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        let mut inner = self.inner.write().await;
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            collection,
            data,
            created_at: Utc::now(),
            updated_at: None,
        };
        let seq = inner.next_seq();
        inner.docs.insert(
            (collection, doc.id.clone()),
            Entry {
                doc: doc.clone(),
                seq,
            },
        );
        Ok(doc)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .docs
            .get(&(collection, id.to_string()))
            .map(|e| e.doc.clone()))
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sorted(collection)
            .into_iter()
            .find(|e| e.doc.data.get(field).and_then(Value::as_str) == Some(value))
            .map(|e| e.doc.clone()))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sorted(collection)
            .into_iter()
            .map(|e| e.doc.clone())
            .collect())
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Option<Document>, StoreError> {
        ensure_object(&data)?;
        let mut inner = self.inner.write().await;
        Ok(inner
            .docs
            .get_mut(&(collection, id.to_string()))
            .map(|entry| {
                entry.doc.data = data;
                entry.doc.updated_at = Some(Utc::now());
                entry.doc.clone()
            }))
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        let mut inner = self.inner.write().await;
        let key = (collection, id.to_string());

        if let Some(entry) = inner.docs.get_mut(&key) {
            if let (Some(existing), Value::Object(incoming)) = (entry.doc.data.as_object_mut(), data)
            {
                existing.extend(incoming);
            }
            entry.doc.updated_at = Some(Utc::now());
            return Ok(entry.doc.clone());
        }

        let doc = Document {
            id: id.to_string(),
            collection,
            data,
            created_at: Utc::now(),
            updated_at: None,
        };
        let seq = inner.next_seq();
        inner.docs.insert(
            key,
            Entry {
                doc: doc.clone(),
                seq,
            },
        );
        Ok(doc)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.docs.remove(&(collection, id.to_string())).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
