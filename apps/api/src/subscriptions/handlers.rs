use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::extract::{IdPath, ValidJson, ValidQuery};
use crate::models::subscription::{SubscriptionItemRow, SubscriptionRow};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;
use crate::subscriptions::store;

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    pub creator_id: Uuid,
}

/// GET /api/v1/subscriptions
pub async fn handle_list_subscriptions(
    State(state): State<AppState>,
    identity: Identity,
    ValidQuery(page): ValidQuery<PageParams>,
) -> Result<Json<Page<SubscriptionItemRow>>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::list_subscriptions(&state.db, viewer.id, &page).await?))
}

/// POST /api/v1/subscriptions
pub async fn handle_subscribe(
    State(state): State<AppState>,
    identity: Identity,
    ValidJson(req): ValidJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriptionRow>), AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    let subscription = store::subscribe(&state.db, viewer.id, req.creator_id).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /api/v1/subscriptions/:creator_id
pub async fn handle_unsubscribe(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(creator_id): IdPath<Uuid>,
) -> Result<Json<SubscriptionRow>, AppError> {
    let viewer = identity.require_viewer(&state.db).await?;
    Ok(Json(store::unsubscribe(&state.db, viewer.id, creator_id).await?))
}
