/**
 * Settings Routes
 * Per-page editable copy: public read, admin merge-write
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::{ApiError, ApiResult};
use crate::models::settings::{load_page, save_page};
use crate::models::SettingsPage;
use crate::routes::auth::AdminSession;
use crate::state::AppState;

fn page(name: &str) -> ApiResult<SettingsPage> {
    SettingsPage::parse(name).ok_or_else(|| ApiError::not_found("Unknown settings page"))
}

/// GET /api/settings/{page} - Stored settings, or defaults when unset
pub async fn get_settings(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(load_page(state.store(), page(&name)?).await?))
}

/// PUT /api/admin/settings/{page}
pub async fn put_settings(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    Ok(Json(save_page(state.store(), page(&name)?, body).await?))
}
