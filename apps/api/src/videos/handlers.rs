use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::extract::{IdPath, ValidJson, ValidQuery};
use crate::models::video::{VideoCardRow, VideoDetailRow, VideoRow, VideoViewRow, VideoVisibility};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;
use crate::videos::store::{self, NewVideo, VideoChanges, VideoFeed};

#[derive(Debug, Deserialize, Validate)]
pub struct VideoFeedQuery {
    pub category_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 100), custom(function = "crate::extract::not_blank"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub visibility: Option<VideoVisibility>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 100), custom(function = "crate::extract::not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub visibility: Option<VideoVisibility>,
}

/// GET /api/v1/videos
pub async fn handle_list_videos(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageParams>,
    ValidQuery(query): ValidQuery<VideoFeedQuery>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let feed = VideoFeed::Public {
        category_id: query.category_id,
        user_id: query.user_id,
    };
    Ok(Json(store::list_videos(&state.db, &feed, &page).await?))
}

/// GET /api/v1/feed/subscriptions
pub async fn handle_subscription_feed(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let feed = VideoFeed::Subscribed {
        viewer_id: viewer.id,
    };
    Ok(Json(store::list_videos(&state.db, &feed, &page).await?))
}

/// GET /api/v1/videos/:id
pub async fn handle_get_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<VideoDetailRow>, AppError> {
    let viewer_id = identity.viewer_id(&state.db).await?;
    Ok(Json(store::get_video(&state.db, id, viewer_id).await?))
}

/// GET /api/v1/videos/:id/suggestions
pub async fn handle_suggestions(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer_id = identity.viewer_id(&state.db).await?;
    let category_id = store::visible_video_category(&state.db, id, viewer_id).await?;
    let feed = VideoFeed::Suggestions {
        video_id: id,
        category_id,
    };
    Ok(Json(store::list_videos(&state.db, &feed, &page).await?))
}

/// POST /api/v1/videos/:id/views
pub async fn handle_record_view(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<VideoViewRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::record_view(&state.db, viewer.id, id).await?))
}

/// GET /api/v1/studio/videos
pub async fn handle_studio_videos(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let feed = VideoFeed::Studio { owner_id: viewer.id };
    Ok(Json(store::list_videos(&state.db, &feed, &page).await?))
}

/// POST /api/v1/studio/videos
pub async fn handle_create_video(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoRow>), AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let video = store::create_video(
        &state.db,
        viewer.id,
        NewVideo {
            title: req.title.trim(),
            description: req.description.as_deref(),
            category_id: req.category_id,
            visibility: req.visibility.unwrap_or(VideoVisibility::Private),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(video)))
}

/// PATCH /api/v1/studio/videos/:id
pub async fn handle_update_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
    ValidJson(req): ValidJson<UpdateVideoRequest>,
) -> Result<Json<VideoRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let changes = VideoChanges {
        title: req.title.as_deref().map(str::trim),
        description: req.description.as_deref(),
        category_id: req.category_id,
        visibility: req.visibility,
    };
    Ok(Json(store::update_video(&state.db, viewer.id, id, changes).await?))
}

/// DELETE /api/v1/studio/videos/:id
pub async fn handle_delete_video(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<VideoRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::delete_video(&state.db, viewer.id, id).await?))
}
