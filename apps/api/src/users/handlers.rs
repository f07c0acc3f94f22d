use axum::{extract::State, Json};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::extract::IdPath;
use crate::guard::found;
use crate::models::user::UserProfileRow;
use crate::state::AppState;

/// A channel page header. Only public videos count towards `video_count`.
pub async fn get_profile(
    pool: &PgPool,
    user_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<UserProfileRow, AppError> {
    let row = sqlx::query_as::<_, UserProfileRow>(
        r#"
        SELECT u.id, u.name, u.image_url, u.created_at,
               (SELECT COUNT(*) FROM subscriptions agg WHERE agg.creator_id = u.id) AS subscriber_count,
               (SELECT COUNT(*) FROM videos agg
                 WHERE agg.user_id = u.id AND agg.visibility = 'public') AS video_count,
               EXISTS (SELECT 1 FROM subscriptions agg
                 WHERE agg.creator_id = u.id AND agg.viewer_id = $2) AS viewer_subscribed
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await?;

    found(row, "User")
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    identity: Identity,
    IdPath(id): IdPath<Uuid>,
) -> Result<Json<UserProfileRow>, AppError> {
    let viewer_id = identity.viewer_id(&state.db).await?;
    Ok(Json(get_profile(&state.db, id, viewer_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::video::VideoVisibility;
    use crate::test_support::{create_user, create_video, test_pool};

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_profile_counts_and_viewer_state() {
        let pool = test_pool().await;
        let creator = create_user(&pool, "creator").await;
        let fan = create_user(&pool, "fan").await;
        create_video(&pool, creator, None, VideoVisibility::Public).await;
        create_video(&pool, creator, None, VideoVisibility::Private).await;
        crate::subscriptions::store::subscribe(&pool, fan, creator).await.unwrap();

        let as_fan = get_profile(&pool, creator, Some(fan)).await.unwrap();
        assert_eq!(as_fan.video_count, 1);
        assert_eq!(as_fan.subscriber_count, 1);
        assert!(as_fan.viewer_subscribed);

        let anonymous = get_profile(&pool, creator, None).await.unwrap();
        assert!(!anonymous.viewer_subscribed);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_missing_user_not_found() {
        let pool = test_pool().await;
        assert!(matches!(
            get_profile(&pool, Uuid::new_v4(), None).await,
            Err(AppError::NotFound(_))
        ));
    }
}
