use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::extract::{IdPath, ValidJson, ValidQuery};
use crate::models::playlist::{PlaylistItemRow, PlaylistRow, PlaylistVideoRow};
use crate::models::video::VideoCardRow;
use crate::pagination::{Page, PageParams};
use crate::playlists::store;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100), custom(function = "crate::extract::not_blank"))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddPlaylistVideoRequest {
    pub video_id: Uuid,
}

/// GET /api/v1/playlists
pub async fn handle_list_playlists(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<PlaylistItemRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::list_playlists(&state.db, viewer.id, None, &page).await?))
}

/// GET /api/v1/playlists/for-video/:video_id
pub async fn handle_playlists_for_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(video_id): IdPath<Uuid>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<PlaylistItemRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(
        store::list_playlists(&state.db, viewer.id, Some(video_id), &page).await?,
    ))
}

/// GET /api/v1/playlists/history
pub async fn handle_history(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::list_history(&state.db, viewer.id, &page).await?))
}

/// GET /api/v1/playlists/liked
pub async fn handle_liked(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::list_liked(&state.db, viewer.id, &page).await?))
}

/// GET /api/v1/playlists/:id
pub async fn handle_get_playlist(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<PlaylistRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::get_playlist(&state.db, viewer.id, id).await?))
}

/// GET /api/v1/playlists/:id/videos
pub async fn handle_playlist_videos(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    store::get_playlist(&state.db, viewer.id, id).await?;
    Ok(Json(
        store::list_playlist_videos(&state.db, viewer.id, id, &page).await?,
    ))
}

/// POST /api/v1/playlists
pub async fn handle_create_playlist(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<PlaylistRow>), AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let playlist =
        store::create_playlist(&state.db, viewer.id, req.name.trim(), req.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// DELETE /api/v1/playlists/:id
pub async fn handle_delete_playlist(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<PlaylistRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::delete_playlist(&state.db, viewer.id, id).await?))
}

/// POST /api/v1/playlists/:id/videos
pub async fn handle_add_playlist_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
    ValidJson(req): ValidJson<AddPlaylistVideoRequest>,
) -> Result<Json<PlaylistVideoRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(
        store::add_video(&state.db, viewer.id, id, req.video_id).await?,
    ))
}

/// DELETE /api/v1/playlists/:id/videos/:video_id
pub async fn handle_remove_playlist_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath((id, video_id)): IdPath<(Uuid, Uuid)>,
) -> Result<Json<PlaylistVideoRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(
        store::remove_video(&state.db, viewer.id, id, video_id).await?,
    ))
}
