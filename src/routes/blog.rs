/**
 * Blog Routes
 * Public listing and article pages. Admin CRUD lives in `entries`.
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::entries::find_by_slug;
use super::ApiResult;
use crate::models::BlogPost;
use crate::state::AppState;
use crate::store::{list_records, Collection, Record};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog (list)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    12
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<Record<BlogPost>>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - Posts newest first, paginated
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> ApiResult<Json<BlogListResponse>> {
    let page_size = query.page_size.clamp(1, 100);
    let page = query.page.max(1);

    let posts = list_records::<BlogPost>(state.store(), Collection::BlogPosts).await?;
    let total = posts.len();
    let items = posts
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Ok(Json(BlogListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/blog/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Record<BlogPost>>> {
    Ok(Json(find_by_slug::<BlogPost>(state.store(), &slug).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn seed(state: &crate::state::AppState, count: usize) {
        for i in 0..count {
            let (status, _) = send(
                app(state.clone()),
                admin_json(
                    "POST",
                    "/api/admin/blog",
                    &json!({
                        "title": format!("Wedding Tips {}", i),
                        "author": "Ningrat",
                        "excerpt": "Ten things to know before the big day",
                        "heroImageUrl": "https://cdn.test/hero.jpg",
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn test_list_posts_paginates_newest_first() {
        let state = state();
        seed(&state, 3).await;

        let (status, body) = send(app(state.clone()), get("/api/blog?page=1&pageSize=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["slug"], "wedding-tips-2");

        let (_, body) = send(app(state), get("/api/blog?page=2&pageSize=2")).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["slug"], "wedding-tips-0");
    }

    #[tokio::test]
    async fn test_list_posts_huge_page_is_empty() {
        let state = state();
        seed(&state, 1).await;

        let (status, body) = send(
            app(state),
            get("/api/blog?page=18446744073709551615&pageSize=100"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["items"].as_array().unwrap().is_empty());
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_get_post_by_slug() {
        let state = state();
        seed(&state, 1).await;

        let (status, body) = send(app(state.clone()), get("/api/blog/wedding-tips-0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["author"], "Ningrat");

        let (status, _) = send(app(state), get("/api/blog/unknown-post")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
