pub mod blocks;
pub mod slug;

pub use blocks::{BlockContent, BlockError, BlockKind, ContentBlock, ContentBlocks, Direction};
pub use slug::{is_valid_slug, slugify};
