/**
 * Story Routes
 * Public story page: the story plus related stories
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::entries::find_by_slug;
use super::ApiResult;
use crate::models::Story;
use crate::state::AppState;
use crate::store::{list_records, Collection, Record};

const RELATED_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
pub struct StoryPageResponse {
    pub story: Record<Story>,
    pub related: Vec<Record<Story>>,
}

/// Up to three other stories of the same category, newest first.
fn related_stories(story: &Record<Story>, all: Vec<Record<Story>>) -> Vec<Record<Story>> {
    let category = story.data.category_or_default();
    all.into_iter()
        .filter(|other| other.id != story.id && other.data.category_or_default() == category)
        .take(RELATED_LIMIT)
        .collect()
}

/// GET /api/stories/{slug}
pub async fn get_story(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<StoryPageResponse>> {
    let story = find_by_slug::<Story>(state.store(), &slug).await?;
    let all = list_records::<Story>(state.store(), Collection::Stories).await?;
    let related = related_stories(&story, all);

    Ok(Json(StoryPageResponse { story, related }))
}
