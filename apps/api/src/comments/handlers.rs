use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;
use crate::comments::store::{self, Thread};
use crate::errors::AppError;
use crate::extract::{IdPath, ValidJson, ValidQuery};
use crate::models::comment::{CommentItemRow, CommentRow};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentThreadQuery {
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub video_id: Uuid,
    pub parent_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000), custom(function = "crate::extract::not_blank"))]
    pub value: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000), custom(function = "crate::extract::not_blank"))]
    pub value: String,
}

/// GET /api/v1/videos/:video_id/comments
pub async fn handle_list_comments(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(video_id): IdPath<Uuid>,
    ValidQuery(page): ValidQuery<PageParams>,
    ValidQuery(thread): ValidQuery<CommentThreadQuery>,
) -> Result<Json<Page<CommentItemRow>>, AppError> {
    let viewer_id = identity.viewer_id(&state.db).await?;
    let thread = match thread.parent_id {
        Some(parent_id) => Thread::Replies(parent_id),
        None => Thread::Root,
    };
    let page = store::list_comments(&state.db, video_id, thread, viewer_id, &page).await?;
    Ok(Json(page))
}

/// POST /api/v1/comments
pub async fn handle_create_comment(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentRow>), AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let comment = store::create_comment(
        &state.db,
        viewer.id,
        req.video_id,
        req.parent_id,
        req.value.trim(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PATCH /api/v1/comments/:id
pub async fn handle_update_comment(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
    ValidJson(req): ValidJson<UpdateCommentRequest>,
) -> Result<Json<CommentRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let comment = store::update_comment(&state.db, viewer.id, id, req.value.trim()).await?;
    Ok(Json(comment))
}

/// DELETE /api/v1/comments/:id
pub async fn handle_delete_comment(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<CommentRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let comment = store::delete_comment(&state.db, viewer.id, id).await?;
    Ok(Json(comment))
}
