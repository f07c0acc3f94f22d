use axum::{extract::State, Json};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::extract::IdPath;
use crate::models::reaction::ReactionType;
use crate::reactions::store::{toggle_reaction, ReactionState, ReactionTarget};
use crate::state::AppState;

async fn toggle(
    state: &AppState,
    identity: &Identity,
    target: ReactionTarget,
    target_id: Uuid,
    kind: ReactionType,
) -> Result<Json<ReactionState>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let reaction = toggle_reaction(&state.db, target, viewer.id, target_id, kind).await?;
    Ok(Json(reaction))
}

/// POST /api/v1/videos/:id/like
pub async fn handle_like_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<ReactionState>, AppError> {
    toggle(&state, &identity, ReactionTarget::Video, id, ReactionType::Like).await
}

/// POST /api/v1/videos/:id/dislike
pub async fn handle_dislike_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<ReactionState>, AppError> {
    toggle(&state, &identity, ReactionTarget::Video, id, ReactionType::Dislike).await
}

/// POST /api/v1/comments/:id/like
pub async fn handle_like_comment(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<ReactionState>, AppError> {
    toggle(&state, &identity, ReactionTarget::Comment, id, ReactionType::Like).await
}

/// POST /api/v1/comments/:id/dislike
pub async fn handle_dislike_comment(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<ReactionState>, AppError> {
    toggle(&state, &identity, ReactionTarget::Comment, id, ReactionType::Dislike).await
}
