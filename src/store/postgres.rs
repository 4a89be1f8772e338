use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ensure_object, Collection, Document, DocumentStore, StoreError};
use crate::db::models::DocumentRow;

const COLUMNS: &str = "collection, id, data, created_at, updated_at";

/// Document store over the `documents` JSONB table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: Arc<PgPool>,
}

impl PgDocumentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let collection = Collection::parse(&row.collection)
            .ok_or_else(|| StoreError::UnknownCollection(row.collection.clone()))?;
        Ok(Document {
            id: row.id,
            collection,
            data: row.data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        ))
        .bind(collection.as_str())
        .bind(Uuid::new_v4().to_string())
        .bind(&data)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = $2",
            COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents \
             WHERE collection = $1 AND data->>$2 = $3 \
             ORDER BY created_at DESC LIMIT 1",
            COLUMNS
        ))
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE collection = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(collection.as_str())
        .fetch_all(self.pool.as_ref())
        .await?
        .into_iter()
        .map(Document::try_from)
        .collect()
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Option<Document>, StoreError> {
        ensure_object(&data)?;
        sqlx::query_as::<_, DocumentRow>(&format!(
            "UPDATE documents SET data = $3, updated_at = now() \
             WHERE collection = $1 AND id = $2 RETURNING {}",
            COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        ensure_object(&data)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE \
             SET data = documents.data || EXCLUDED.data, updated_at = now() \
             RETURNING {}",
            COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_row_conversion() {
        let row = DocumentRow {
            collection: "blogPosts".into(),
            id: "p1".into(),
            data: json!({"title": "x"}),
            created_at: Utc::now(),
            updated_at: None,
        };
        let doc = Document::try_from(row).unwrap();
        assert_eq!(doc.collection, Collection::BlogPosts);

        let row = DocumentRow {
            collection: "legacy".into(),
            id: "p1".into(),
            data: json!({}),
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(matches!(
            Document::try_from(row),
            Err(StoreError::UnknownCollection(_))
        ));
    }
}
