/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod blocks;
pub mod blog;
pub mod contact;
pub mod dashboard;
pub mod entries;
pub mod files;
pub mod health;
pub mod invoices;
pub mod pages;
pub mod settings;
pub mod sitemap;
pub mod stories;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::content::is_valid_slug;
use crate::store::{Collection, DocumentStore};

/// Success response (for delete)
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Decode a JSON body into a model. Shape errors are reported as a
/// validation failure on `body`.
pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::invalid_field("body", e.to_string()))
}

pub(crate) fn check_slug(slug: &str) -> ApiResult<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Invalid slug: use only lowercase letters, numbers, and hyphens",
        ))
    }
}

/// Reject a slug already used by another document of the collection.
pub(crate) async fn ensure_unique_slug(
    store: &dyn DocumentStore,
    collection: Collection,
    slug: &str,
    own_id: Option<&str>,
) -> ApiResult<()> {
    match store.find_by_field(collection, "slug", slug).await? {
        Some(doc) if Some(doc.id.as_str()) != own_id => {
            Err(ApiError::Conflict("Slug already exists".to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::{SiteConfig, StorageConfig};
    use crate::state::AppState;

    pub fn storage_config() -> StorageConfig {
        StorageConfig {
            public_base_url: "https://cdn.test/gallery".to_string(),
            quota_gb: 1.0,
            upload_max_bytes: 1024,
            ..StorageConfig::default()
        }
    }

    pub fn state() -> AppState {
        AppState::in_memory(
            &storage_config(),
            SiteConfig {
                base_url: "https://www.ningratwedding.id".to_string(),
            },
        )
    }

    pub fn app(state: AppState) -> Router {
        crate::create_app(state)
    }

    pub fn bearer() -> String {
        let token = super::auth::create_access_token("owner@example.com").unwrap();
        format!("Bearer {}", token)
    }

    /// Send a request, returning the status and the body parsed as JSON
    /// (`Value::Null` for an empty or non-JSON body).
    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub fn admin_get(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header("authorization", bearer())
            .body(Body::empty())
            .unwrap()
    }

    pub fn admin_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", bearer())
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    pub fn public_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }
}
