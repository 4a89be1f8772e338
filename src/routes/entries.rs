//! Admin CRUD shared by stories and blog posts.
//!
//! Handlers are generic over [`Entry`] and mounted once per collection
//! (`entries::create::<Story>`). The slug is re-derived from the title on
//! every save and must be unique within the collection.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::{decode, ensure_unique_slug, ApiError, ApiResult, ListResponse, SuccessResponse};
use crate::models::Entry;
use crate::routes::auth::AdminSession;
use crate::state::AppState;
use crate::store::{get_record, list_records, to_data, DocumentStore, Record};

/// Newest first.
pub async fn list<T: Entry>(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<ListResponse<Record<T>>>> {
    let records = list_records::<T>(state.store(), T::COLLECTION).await?;
    Ok(Json(records.into()))
}

pub async fn get<T: Entry>(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<T>>> {
    get_record::<T>(state.store(), T::COLLECTION, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found"))
}

pub async fn create<T: Entry>(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Record<T>>)> {
    let entry = decode::<T>(body)?.prepare()?;
    ensure_unique_slug(state.store(), T::COLLECTION, entry.slug(), None).await?;

    let doc = state.store().insert(T::COLLECTION, to_data(&entry)?).await?;
    tracing::info!(collection = %T::COLLECTION, id = %doc.id, slug = entry.slug(), "entry created");

    Ok((StatusCode::CREATED, Json(doc.into_record()?)))
}

pub async fn update<T: Entry>(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Record<T>>> {
    let entry = decode::<T>(body)?.prepare()?;
    ensure_unique_slug(state.store(), T::COLLECTION, entry.slug(), Some(&id)).await?;

    let doc = state
        .store()
        .replace(T::COLLECTION, &id, to_data(&entry)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;
    tracing::info!(collection = %T::COLLECTION, %id, slug = entry.slug(), "entry updated");

    Ok(Json(doc.into_record()?))
}

pub async fn delete<T: Entry>(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.store().delete(T::COLLECTION, &id).await? {
        return Err(ApiError::not_found("Not found"));
    }
    tracing::info!(collection = %T::COLLECTION, %id, "entry deleted");
    Ok(Json(SuccessResponse::ok()))
}

/// Public lookup by slug.
pub(crate) async fn find_by_slug<T: Entry>(
    store: &dyn DocumentStore,
    slug: &str,
) -> ApiResult<Record<T>> {
    super::check_slug(slug)?;
    let doc = store
        .find_by_field(T::COLLECTION, "slug", slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;
    Ok(doc.into_record()?)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn story(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "credit": "Ningrat Team",
            "heroImageUrl": "https://cdn.test/gallery/uploads/hero.jpg",
            "category": "Weddings",
            "contentBlocks": [
                { "id": "b1", "type": "text", "content": "<p>Hello</p><script>x</script>" }
            ]
        })
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let (status, _) = send(app(state()), get("/api/admin/stories")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_sanitizes_blocks() {
        let (status, body) = send(
            app(state()),
            admin_json("POST", "/api/admin/stories", &story("Jane & John's Day!")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "jane-and-johns-day");
        assert!(body["id"].is_string());
        assert!(body["createdAt"].is_string());
        let html = body["contentBlocks"][0]["content"].as_str().unwrap();
        assert!(!html.contains("script"));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_a_conflict() {
        let state = state();
        let (status, _) = send(
            app(state.clone()),
            admin_json("POST", "/api/admin/stories", &story("Jane & John")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app(state),
            admin_json("POST", "/api/admin/stories", &story("Jane and John")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Slug already exists");
    }

    #[tokio::test]
    async fn test_update_regenerates_slug_and_keeps_own_slug() {
        let state = state();
        let (_, created) = send(
            app(state.clone()),
            admin_json("POST", "/api/admin/stories", &story("First Title")),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(
            app(state.clone()),
            admin_json(
                "PUT",
                &format!("/api/admin/stories/{}", id),
                &story("First Title"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "first-title");

        let (status, body) = send(
            app(state),
            admin_json(
                "PUT",
                &format!("/api/admin/stories/{}", id),
                &story("Second Title"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "second-title");
        assert!(body["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_validation_failure_lists_fields() {
        let (status, body) = send(
            app(state()),
            admin_json(
                "POST",
                "/api/admin/blog",
                &json!({ "title": "ab", "author": "x", "heroImageUrl": "not a url" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        assert!(body["fields"]["title"].is_array());
        assert!(body["fields"]["author"].is_array());
        assert!(body["fields"]["heroImageUrl"].is_array());
    }

    #[tokio::test]
    async fn test_missing_entry_is_not_found() {
        let state = state();
        let (status, _) = send(app(state.clone()), admin_get("/api/admin/blog/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app(state),
            admin_json("DELETE", "/api/admin/stories/nope", &json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
