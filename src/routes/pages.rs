/**
 * Page Routes
 * One page-data endpoint per public page of the site
 */
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::models::settings::{
    self, AboutSettings, ContactSettings, GeneralSettings, HomeSettings, PortfolioSettings,
    ServicePackage, ServicesSettings,
};
use crate::models::Story;
use crate::state::AppState;
use crate::store::{list_records, Collection, Record};

/// Stories shown on the home page.
const HOME_STORY_LIMIT: usize = 6;

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub general: GeneralSettings,
    pub settings: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<Record<Story>>>,
}

async fn page<T: settings::PageSettings>(
    state: &AppState,
    stories: Option<usize>,
) -> ApiResult<Json<PageResponse<T>>> {
    let general = settings::load::<GeneralSettings>(state.store()).await?;
    let settings = settings::load::<T>(state.store()).await?;
    let stories = match stories {
        Some(limit) => Some(
            list_records::<Story>(state.store(), Collection::Stories)
                .await?
                .into_iter()
                .take(limit)
                .collect(),
        ),
        None => None,
    };
    Ok(Json(PageResponse {
        general,
        settings,
        stories,
    }))
}

/// GET /api/pages/home
pub async fn home(State(state): State<AppState>) -> ApiResult<Json<PageResponse<HomeSettings>>> {
    page(&state, Some(HOME_STORY_LIMIT)).await
}

/// GET /api/pages/about
pub async fn about(State(state): State<AppState>) -> ApiResult<Json<PageResponse<AboutSettings>>> {
    page(&state, None).await
}

/// GET /api/pages/portfolio - Every story, newest first
pub async fn portfolio(
    State(state): State<AppState>,
) -> ApiResult<Json<PageResponse<PortfolioSettings>>> {
    page(&state, Some(usize::MAX)).await
}

/// GET /api/pages/services
pub async fn services(
    State(state): State<AppState>,
) -> ApiResult<Json<PageResponse<ServicesSettings>>> {
    page(&state, None).await
}

/// GET /api/pages/contact
pub async fn contact(
    State(state): State<AppState>,
) -> ApiResult<Json<PageResponse<ContactSettings>>> {
    page(&state, None).await
}

#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub package: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub general: GeneralSettings,
    pub package: ServicePackage,
}

/// GET /api/pages/checkout?package=<id>
pub async fn checkout(
    State(state): State<AppState>,
    Query(query): Query<CheckoutQuery>,
) -> ApiResult<Json<CheckoutResponse>> {
    let id = query
        .package
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Package is required"))?;

    let services = settings::load::<ServicesSettings>(state.store()).await?;
    let package = services
        .package(&id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Package not found"))?;

    Ok(Json(CheckoutResponse {
        general: settings::load(state.store()).await?,
        package,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_home_lists_at_most_six_newest_stories() {
        let state = state();
        for i in 0..7 {
            let (status, _) = send(
                app(state.clone()),
                admin_json(
                    "POST",
                    "/api/admin/stories",
                    &json!({
                        "title": format!("Story Number {}", i),
                        "credit": "Ningrat Team",
                        "heroImageUrl": "https://cdn.test/hero.jpg",
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(app(state.clone()), get("/api/pages/home")).await;
        assert_eq!(status, StatusCode::OK);
        let stories = body["stories"].as_array().unwrap();
        assert_eq!(stories.len(), 6);
        assert_eq!(stories[0]["slug"], "story-number-6");
        assert!(body["settings"]["heroMedia"].is_array());

        let (_, body) = send(app(state), get("/api/pages/portfolio")).await;
        assert_eq!(body["stories"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_about_has_no_stories() {
        let (status, body) = send(app(state()), get("/api/pages/about")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("stories").is_none());
        assert!(body.get("general").is_some());
    }

    #[tokio::test]
    async fn test_checkout_resolves_package_by_id() {
        let state = state();
        let (status, saved) = send(
            app(state.clone()),
            admin_json(
                "PUT",
                "/api/admin/settings/services",
                &json!({
                    "packages": [
                        { "name": "Silver", "price": "Rp 10.000.000", "features": ["1 photographer"] },
                        { "name": "Gold", "price": "Rp 20.000.000", "highlight": true }
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let gold_id = saved["packages"][1]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(state.clone()),
            get(&format!("/api/pages/checkout?package={}", gold_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["package"]["name"], "Gold");

        let (status, _) = send(app(state.clone()), get("/api/pages/checkout?package=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app(state), get("/api/pages/checkout")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
