//! Ordered, typed content segments that make up a story or blog post body.
//!
//! On the wire a block is `{ "id", "type", "content" }`; the payload shape is
//! fixed by the type tag and checked when the block is deserialised.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::ValidateUrl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    H1,
    H2,
    TitleAndParagraph,
    ImageFull,
    ImageSplit,
    ImageTri,
    Video,
    Link,
}

impl BlockKind {
    pub const ALL: [BlockKind; 9] = [
        BlockKind::Text,
        BlockKind::H1,
        BlockKind::H2,
        BlockKind::TitleAndParagraph,
        BlockKind::ImageFull,
        BlockKind::ImageSplit,
        BlockKind::ImageTri,
        BlockKind::Video,
        BlockKind::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::H1 => "h1",
            BlockKind::H2 => "h2",
            BlockKind::TitleAndParagraph => "title_and_paragraph",
            BlockKind::ImageFull => "image_full",
            BlockKind::ImageSplit => "image_split",
            BlockKind::ImageTri => "image_tri",
            BlockKind::Video => "video",
            BlockKind::Link => "link",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Maximum number of images an image block holds.
    pub fn max_images(&self) -> Option<usize> {
        match self {
            BlockKind::ImageFull => Some(1),
            BlockKind::ImageSplit => Some(2),
            BlockKind::ImageTri => Some(3),
            _ => None,
        }
    }

    pub fn empty_content(&self) -> BlockContent {
        match self {
            BlockKind::Text => BlockContent::Text(String::new()),
            BlockKind::H1 => BlockContent::H1(String::new()),
            BlockKind::H2 => BlockContent::H2(String::new()),
            BlockKind::TitleAndParagraph => {
                BlockContent::TitleAndParagraph(TitleAndParagraph::default())
            }
            BlockKind::ImageFull => BlockContent::ImageFull(Vec::new()),
            BlockKind::ImageSplit => BlockContent::ImageSplit(Vec::new()),
            BlockKind::ImageTri => BlockContent::ImageTri(Vec::new()),
            BlockKind::Video => BlockContent::Video(String::new()),
            BlockKind::Link => BlockContent::Link(String::new()),
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAndParagraph {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraph: String,
}

/// Payload of a block; one variant per block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    Text(String),
    H1(String),
    H2(String),
    TitleAndParagraph(TitleAndParagraph),
    ImageFull(Vec<String>),
    ImageSplit(Vec<String>),
    ImageTri(Vec<String>),
    Video(String),
    Link(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("block type '{0}' is not supported")]
    UnknownKind(String),
    #[error("block '{kind}' expects {expected} content")]
    WrongPayload { kind: BlockKind, expected: &'static str },
    #[error("block '{kind}' holds at most {max} images, got {got}")]
    TooManyImages { kind: BlockKind, max: usize, got: usize },
    #[error("block {index} ({kind}) has no images")]
    MissingImages { index: usize, kind: BlockKind },
    #[error("block {index} ({kind}) contains an invalid URL: {url}")]
    InvalidUrl {
        index: usize,
        kind: BlockKind,
        url: String,
    },
    #[error("no block with id '{0}'")]
    UnknownBlock(String),
    #[error("block is '{actual}', cannot store '{given}' content")]
    KindMismatch { actual: BlockKind, given: BlockKind },
}

impl BlockContent {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Text(_) => BlockKind::Text,
            BlockContent::H1(_) => BlockKind::H1,
            BlockContent::H2(_) => BlockKind::H2,
            BlockContent::TitleAndParagraph(_) => BlockKind::TitleAndParagraph,
            BlockContent::ImageFull(_) => BlockKind::ImageFull,
            BlockContent::ImageSplit(_) => BlockKind::ImageSplit,
            BlockContent::ImageTri(_) => BlockKind::ImageTri,
            BlockContent::Video(_) => BlockKind::Video,
            BlockContent::Link(_) => BlockKind::Link,
        }
    }

    /// Build a payload from its JSON form. `null` reads as the empty payload.
    pub fn from_value(kind: BlockKind, value: Value) -> Result<Self, BlockError> {
        if value.is_null() {
            return Ok(kind.empty_content());
        }

        let text = |value: Value| match value {
            Value::String(s) => Ok(s),
            _ => Err(BlockError::WrongPayload {
                kind,
                expected: "string",
            }),
        };

        let images = |value: Value, max: usize| -> Result<Vec<String>, BlockError> {
            let urls: Vec<String> =
                serde_json::from_value(value).map_err(|_| BlockError::WrongPayload {
                    kind,
                    expected: "a list of image URLs",
                })?;
            if urls.len() > max {
                return Err(BlockError::TooManyImages {
                    kind,
                    max,
                    got: urls.len(),
                });
            }
            Ok(urls)
        };

        Ok(match kind {
            BlockKind::Text => BlockContent::Text(text(value)?),
            BlockKind::H1 => BlockContent::H1(text(value)?),
            BlockKind::H2 => BlockContent::H2(text(value)?),
            BlockKind::Video => BlockContent::Video(text(value)?),
            BlockKind::Link => BlockContent::Link(text(value)?),
            BlockKind::TitleAndParagraph => BlockContent::TitleAndParagraph(
                serde_json::from_value(value).map_err(|_| BlockError::WrongPayload {
                    kind,
                    expected: "{ title, paragraph }",
                })?,
            ),
            BlockKind::ImageFull => BlockContent::ImageFull(images(value, 1)?),
            BlockKind::ImageSplit => BlockContent::ImageSplit(images(value, 2)?),
            BlockKind::ImageTri => BlockContent::ImageTri(images(value, 3)?),
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            BlockContent::Text(s)
            | BlockContent::H1(s)
            | BlockContent::H2(s)
            | BlockContent::Video(s)
            | BlockContent::Link(s) => Value::String(s.clone()),
            BlockContent::TitleAndParagraph(tp) => serde_json::json!({
                "title": tp.title,
                "paragraph": tp.paragraph,
            }),
            BlockContent::ImageFull(urls)
            | BlockContent::ImageSplit(urls)
            | BlockContent::ImageTri(urls) => {
                Value::Array(urls.iter().cloned().map(Value::String).collect())
            }
        }
    }

    fn images_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            BlockContent::ImageFull(urls)
            | BlockContent::ImageSplit(urls)
            | BlockContent::ImageTri(urls) => Some(urls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct ContentBlock {
    pub id: String,
    pub content: BlockContent,
}

#[derive(Serialize, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
}

impl TryFrom<RawBlock> for ContentBlock {
    type Error = BlockError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = BlockKind::parse(&raw.kind).ok_or(BlockError::UnknownKind(raw.kind))?;
        Ok(ContentBlock {
            id: raw.id,
            content: BlockContent::from_value(kind, raw.content)?,
        })
    }
}

impl From<ContentBlock> for RawBlock {
    fn from(block: ContentBlock) -> Self {
        RawBlock {
            id: block.id,
            kind: block.content.kind().as_str().to_string(),
            content: block.content.to_value(),
        }
    }
}

impl ContentBlock {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: kind.empty_content(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// The ordered body of a story or post. Order is array position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBlocks(Vec<ContentBlock>);

impl ContentBlocks {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self(blocks)
    }

    pub fn as_slice(&self) -> &[ContentBlock] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a block of `kind` with its empty payload.
    pub fn append(&mut self, kind: BlockKind) -> &ContentBlock {
        self.0.push(ContentBlock::new(kind));
        &self.0[self.0.len() - 1]
    }

    /// Replace one block's payload in place. The block type cannot change.
    pub fn update(&mut self, id: &str, content: BlockContent) -> Result<(), BlockError> {
        let block = self
            .0
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BlockError::UnknownBlock(id.to_string()))?;
        if block.kind() != content.kind() {
            return Err(BlockError::KindMismatch {
                actual: block.kind(),
                given: content.kind(),
            });
        }
        block.content = content;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|b| b.id != id);
        self.0.len() != before
    }

    /// Swap the block at `index` with its neighbour. Returns false (and
    /// leaves the list untouched) at the boundary.
    pub fn move_block(&mut self, index: usize, direction: Direction) -> bool {
        if index >= self.0.len() {
            return false;
        }
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.0.len() => index + 1,
            _ => return false,
        };
        self.0.swap(index, target);
        true
    }

    /// Add an image to an image block, keeping only the newest `max` URLs.
    pub fn push_image(&mut self, id: &str, url: &str) -> Result<(), BlockError> {
        let block = self
            .0
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BlockError::UnknownBlock(id.to_string()))?;
        let kind = block.kind();
        let max = kind.max_images().ok_or(BlockError::WrongPayload {
            kind,
            expected: "string",
        })?;
        if let Some(urls) = block.content.images_mut() {
            urls.push(url.to_string());
            if urls.len() > max {
                let excess = urls.len() - max;
                urls.drain(..excess);
            }
        }
        Ok(())
    }

    /// Strip unsafe markup from text payloads.
    pub fn sanitize(&mut self) {
        for block in &mut self.0 {
            match &mut block.content {
                BlockContent::Text(s) | BlockContent::H1(s) | BlockContent::H2(s) => {
                    *s = ammonia::clean(s);
                }
                BlockContent::TitleAndParagraph(tp) => {
                    tp.title = ammonia::clean(&tp.title);
                    tp.paragraph = ammonia::clean(&tp.paragraph);
                }
                _ => {}
            }
        }
    }

    /// Checks applied before a body is saved: image blocks carry at least
    /// one image and every media/link URL parses. Video and link blocks may
    /// be left empty.
    pub fn check_publishable(&self) -> Result<(), BlockError> {
        for (index, block) in self.0.iter().enumerate() {
            let kind = block.kind();
            match &block.content {
                BlockContent::ImageFull(urls)
                | BlockContent::ImageSplit(urls)
                | BlockContent::ImageTri(urls) => {
                    if urls.is_empty() {
                        return Err(BlockError::MissingImages { index, kind });
                    }
                    if let Some(bad) = urls.iter().find(|u| !u.validate_url()) {
                        return Err(BlockError::InvalidUrl {
                            index,
                            kind,
                            url: bad.clone(),
                        });
                    }
                }
                BlockContent::Video(url) | BlockContent::Link(url) => {
                    if !url.trim().is_empty() && !url.validate_url() {
                        return Err(BlockError::InvalidUrl {
                            index,
                            kind,
                            url: url.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_text_blocks() -> ContentBlocks {
        let mut blocks = ContentBlocks::default();
        for label in ["a", "b", "c"] {
            let id = blocks.append(BlockKind::Text).id.clone();
            blocks
                .update(&id, BlockContent::Text(label.to_string()))
                .unwrap();
        }
        blocks
    }

    fn labels(blocks: &ContentBlocks) -> Vec<String> {
        blocks
            .as_slice()
            .iter()
            .map(|b| match &b.content {
                BlockContent::Text(s) => s.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn test_empty_payload_per_kind() {
        assert_eq!(BlockKind::Text.empty_content().to_value(), json!(""));
        assert_eq!(
            BlockKind::TitleAndParagraph.empty_content().to_value(),
            json!({"title": "", "paragraph": ""})
        );
        assert_eq!(BlockKind::ImageTri.empty_content().to_value(), json!([]));
        assert_eq!(BlockKind::Link.empty_content().to_value(), json!(""));
    }

    #[test]
    fn test_block_wire_format() {
        let value = json!({
            "id": "b1",
            "type": "image_split",
            "content": ["https://cdn.example/a.jpg", "https://cdn.example/b.jpg"]
        });
        let block: ContentBlock = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(block.kind(), BlockKind::ImageSplit);
        assert_eq!(serde_json::to_value(&block).unwrap(), value);
    }

    #[test]
    fn test_block_rejects_mismatched_payload() {
        let wrong = json!({"id": "b1", "type": "h1", "content": ["x"]});
        assert!(serde_json::from_value::<ContentBlock>(wrong).is_err());

        let too_many = json!({"id": "b1", "type": "image_full", "content": ["a", "b"]});
        assert!(serde_json::from_value::<ContentBlock>(too_many).is_err());

        let unknown = json!({"id": "b1", "type": "carousel", "content": []});
        assert!(serde_json::from_value::<ContentBlock>(unknown).is_err());
    }

    #[test]
    fn test_null_content_reads_as_empty() {
        let block: ContentBlock =
            serde_json::from_value(json!({"id": "x", "type": "title_and_paragraph"})).unwrap();
        assert_eq!(
            block.content,
            BlockContent::TitleAndParagraph(TitleAndParagraph::default())
        );
    }

    #[test]
    fn test_move_up_at_top_is_noop() {
        let mut blocks = three_text_blocks();
        assert!(!blocks.move_block(0, Direction::Up));
        assert_eq!(labels(&blocks), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_down_at_bottom_is_noop() {
        let mut blocks = three_text_blocks();
        assert!(!blocks.move_block(2, Direction::Down));
        assert!(!blocks.move_block(7, Direction::Down));
        assert_eq!(labels(&blocks), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_swaps_exactly_two_neighbours() {
        let mut blocks = three_text_blocks();
        assert!(blocks.move_block(1, Direction::Up));
        assert_eq!(labels(&blocks), ["b", "a", "c"]);

        assert!(blocks.move_block(1, Direction::Down));
        assert_eq!(labels(&blocks), ["b", "c", "a"]);
    }

    #[test]
    fn test_update_keeps_kind() {
        let mut blocks = ContentBlocks::default();
        let id = blocks.append(BlockKind::H2).id.clone();
        let err = blocks
            .update(&id, BlockContent::Text("x".into()))
            .unwrap_err();
        assert_eq!(
            err,
            BlockError::KindMismatch {
                actual: BlockKind::H2,
                given: BlockKind::Text
            }
        );
        assert!(blocks.update("missing", BlockContent::H2("x".into())).is_err());
    }

    #[test]
    fn test_remove_by_id() {
        let mut blocks = three_text_blocks();
        let id = blocks.as_slice()[1].id.clone();
        assert!(blocks.remove(&id));
        assert!(!blocks.remove(&id));
        assert_eq!(labels(&blocks), ["a", "c"]);
    }

    #[test]
    fn test_push_image_keeps_newest() {
        let mut blocks = ContentBlocks::default();
        let id = blocks.append(BlockKind::ImageSplit).id.clone();
        for url in ["https://x/1.jpg", "https://x/2.jpg", "https://x/3.jpg"] {
            blocks.push_image(&id, url).unwrap();
        }
        assert_eq!(
            blocks.as_slice()[0].content,
            BlockContent::ImageSplit(vec!["https://x/2.jpg".into(), "https://x/3.jpg".into()])
        );

        let text_id = blocks.append(BlockKind::Text).id.clone();
        assert!(blocks.push_image(&text_id, "https://x/4.jpg").is_err());
    }

    #[test]
    fn test_sanitize_strips_scripts() {
        let mut blocks = ContentBlocks::default();
        let id = blocks.append(BlockKind::Text).id.clone();
        blocks
            .update(
                &id,
                BlockContent::Text("<script>alert(1)</script><b>hi</b>".into()),
            )
            .unwrap();
        blocks.sanitize();
        assert_eq!(
            blocks.as_slice()[0].content,
            BlockContent::Text("<b>hi</b>".into())
        );
    }

    #[test]
    fn test_check_publishable() {
        let mut blocks = ContentBlocks::default();
        let id = blocks.append(BlockKind::ImageFull).id.clone();
        assert!(matches!(
            blocks.check_publishable(),
            Err(BlockError::MissingImages { index: 0, .. })
        ));

        blocks.push_image(&id, "not a url").unwrap();
        assert!(matches!(
            blocks.check_publishable(),
            Err(BlockError::InvalidUrl { .. })
        ));

        blocks.push_image(&id, "https://cdn.example/a.jpg").unwrap();
        assert!(blocks.check_publishable().is_ok());
    }

    #[test]
    fn test_empty_video_and_link_blocks_are_publishable() {
        let mut blocks = ContentBlocks::default();
        blocks.append(BlockKind::Video);
        blocks.append(BlockKind::Link);
        assert!(blocks.check_publishable().is_ok());

        let id = blocks.as_slice()[0].id.clone();
        blocks
            .update(&id, BlockContent::Video("youtube dot com".to_string()))
            .unwrap();
        assert!(matches!(
            blocks.check_publishable(),
            Err(BlockError::InvalidUrl { index: 0, .. })
        ));
    }
}
