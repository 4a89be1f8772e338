use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{empty_string_as_none, prepare_body, Entry};
use crate::content::ContentBlocks;
use crate::error::ApiResult;
use crate::store::Collection;

/// Category used for related-story lookups when a story has none.
pub const DEFAULT_CATEGORY: &str = "Weddings";

/// A portfolio entry. `slug` is derived from `title` on every save.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[serde(default)]
    pub slug: String,

    #[validate(length(min = 3, message = "Credit must be at least 3 characters"))]
    pub credit: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(url(message = "Hero image is required and must be a valid URL"))]
    pub hero_image_url: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(url(message = "Audio file must be a valid URL"))]
    pub audio_file_url: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub content_blocks: ContentBlocks,
}

impl Entry for Story {
    const COLLECTION: Collection = Collection::Stories;
    const SECTION: &'static str = "stories";

    fn slug(&self) -> &str {
        &self.slug
    }

    fn prepare(mut self) -> ApiResult<Self> {
        self.validate()?;
        self.slug = prepare_body(&self.title, &mut self.content_blocks)?;
        Ok(self)
    }
}

impl Story {
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}
