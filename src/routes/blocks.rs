/**
 * Block Routes
 * Server-side helpers for the story/blog body editor
 */
use axum::{extract::Path, Json};
use serde::Deserialize;

use super::{ApiError, ApiResult};
use crate::content::{BlockError, BlockKind, ContentBlock, ContentBlocks, Direction};
use crate::routes::auth::AdminSession;

/// One editor action applied to a block list.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BlockEdit {
    Append {
        #[serde(rename = "type")]
        kind: BlockKind,
    },
    Update {
        block: ContentBlock,
    },
    Remove {
        id: String,
    },
    Move {
        index: usize,
        direction: Direction,
    },
    PushImage {
        id: String,
        url: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct BlockEditRequest {
    #[serde(default)]
    pub blocks: ContentBlocks,
    pub edit: BlockEdit,
}

fn apply(blocks: &mut ContentBlocks, edit: BlockEdit) -> Result<(), BlockError> {
    match edit {
        BlockEdit::Append { kind } => {
            blocks.append(kind);
        }
        BlockEdit::Update { block } => blocks.update(&block.id, block.content)?,
        BlockEdit::Remove { id } => {
            if !blocks.remove(&id) {
                return Err(BlockError::UnknownBlock(id));
            }
        }
        // Moving past either end leaves the list as it was.
        BlockEdit::Move { index, direction } => {
            blocks.move_block(index, direction);
        }
        BlockEdit::PushImage { id, url } => blocks.push_image(&id, &url)?,
    }
    Ok(())
}

/// GET /api/admin/blocks/template/{kind}
pub async fn template(
    _session: AdminSession,
    Path(kind): Path<String>,
) -> ApiResult<Json<ContentBlock>> {
    let kind = BlockKind::parse(&kind)
        .ok_or_else(|| ApiError::not_found(format!("Unknown block type '{}'", kind)))?;
    Ok(Json(ContentBlock::new(kind)))
}

/// POST /api/admin/blocks/edit - Returns the list after the edit
pub async fn edit(
    _session: AdminSession,
    Json(request): Json<BlockEditRequest>,
) -> ApiResult<Json<ContentBlocks>> {
    let mut blocks = request.blocks;
    apply(&mut blocks, request.edit)?;
    Ok(Json(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_template_returns_empty_block() {
        let (status, body) = send(
            app(state()),
            admin_get("/api/admin/blocks/template/image_split"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "image_split");
        assert_eq!(body["content"], json!([]));
        assert!(!body["id"].as_str().unwrap().is_empty());

        let (status, body) = send(
            app(state()),
            admin_get("/api/admin/blocks/template/title_and_paragraph"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], json!({ "title": "", "paragraph": "" }));
    }

    #[tokio::test]
    async fn test_template_unknown_kind() {
        let (status, _) = send(app(state()), admin_get("/api/admin/blocks/template/carousel")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_template_requires_session() {
        let (status, _) = send(app(state()), get("/api/admin/blocks/template/text")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_edit_push_image_keeps_newest() {
        let blocks = json!([
            { "id": "a", "type": "image_full", "content": ["https://cdn.test/1.jpg"] },
            { "id": "b", "type": "h1", "content": "Hello" }
        ]);
        let (status, body) = send(
            app(state()),
            admin_json(
                "POST",
                "/api/admin/blocks/edit",
                &json!({
                    "blocks": blocks,
                    "edit": { "op": "pushImage", "id": "a", "url": "https://cdn.test/2.jpg" }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["content"], json!(["https://cdn.test/2.jpg"]));

        let (status, body) = send(
            app(state()),
            admin_json(
                "POST",
                "/api/admin/blocks/edit",
                &json!({ "blocks": blocks, "edit": { "op": "move", "index": 1, "direction": "up" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "b");
    }

    #[tokio::test]
    async fn test_edit_update_rejects_kind_change() {
        let (status, body) = send(
            app(state()),
            admin_json(
                "POST",
                "/api/admin/blocks/edit",
                &json!({
                    "blocks": [{ "id": "a", "type": "text", "content": "x" }],
                    "edit": { "op": "update", "block": { "id": "a", "type": "h2", "content": "y" } }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"]["contentBlocks"].is_array());
    }

    #[test]
    fn test_apply_append_and_remove() {
        let mut blocks = ContentBlocks::default();
        apply(&mut blocks, BlockEdit::Append { kind: BlockKind::Video }).unwrap();
        assert_eq!(blocks.len(), 1);
        let id = blocks.as_slice()[0].id.clone();

        apply(&mut blocks, BlockEdit::Remove { id: id.clone() }).unwrap();
        assert!(blocks.is_empty());
        assert_eq!(
            apply(&mut blocks, BlockEdit::Remove { id: id.clone() }),
            Err(BlockError::UnknownBlock(id))
        );
    }
}
