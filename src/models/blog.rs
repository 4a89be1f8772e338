use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{empty_string_as_none, prepare_body, Entry};
use crate::content::ContentBlocks;
use crate::error::ApiResult;
use crate::store::Collection;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[serde(default)]
    pub slug: String,

    #[validate(length(min = 3, message = "Author must be at least 3 characters"))]
    pub author: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(
        min = 10,
        max = 200,
        message = "Excerpt must be between 10 and 200 characters"
    ))]
    pub excerpt: Option<String>,

    #[serde(default)]
    #[validate(url(message = "Hero image is required and must be a valid URL"))]
    pub hero_image_url: String,

    #[serde(default)]
    pub content_blocks: ContentBlocks,
}

impl Entry for BlogPost {
    const COLLECTION: Collection = Collection::BlogPosts;
    const SECTION: &'static str = "blog";

    fn slug(&self) -> &str {
        &self.slug
    }

    fn prepare(mut self) -> ApiResult<Self> {
        self.validate()?;
        self.slug = prepare_body(&self.title, &mut self.content_blocks)?;
        Ok(self)
    }
}
