use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::guard::found;
use crate::models::subscription::{SubscriptionItemRow, SubscriptionRow};
use crate::pagination::{fetch_page, Page, PageParams, SeekKeys};

/// Creators the viewer follows, most recent subscription first.
pub async fn list_subscriptions(
    pool: &PgPool,
    viewer_id: Uuid,
    params: &PageParams,
) -> Result<Page<SubscriptionItemRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push(
                "SELECT s.viewer_id, s.creator_id, s.created_at, s.updated_at, \
                 u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url, \
                 (SELECT COUNT(*) FROM subscriptions agg WHERE agg.creator_id = u.id) AS subscriber_count \
                 FROM subscriptions s JOIN users u ON u.id = s.creator_id",
            );
        },
        "subscriptions s",
        |qb| {
            qb.push(" AND s.viewer_id = ").push_bind(viewer_id);
        },
        SeekKeys {
            timestamp: "s.created_at",
            id: "s.creator_id",
        },
        params,
    )
    .await
}

/// Subscribes `viewer_id` to `creator_id`. Subscribing twice keeps the
/// original row and only touches `updated_at`.
pub async fn subscribe(pool: &PgPool, viewer_id: Uuid, creator_id: Uuid) -> Result<SubscriptionRow, AppError> {
    if viewer_id == creator_id {
        return Err(AppError::Validation("Cannot subscribe to yourself".to_string()));
    }

    let row = sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions (viewer_id, creator_id)
        SELECT $1, $2
        WHERE EXISTS (SELECT 1 FROM users WHERE id = $2)
        ON CONFLICT (viewer_id, creator_id) DO UPDATE SET updated_at = now()
        RETURNING *
        "#,
    )
    .bind(viewer_id)
    .bind(creator_id)
    .fetch_optional(pool)
    .await?;

    let row = found(row, "Creator")?;
    info!("User {viewer_id} subscribed to {creator_id}");
    Ok(row)
}

pub async fn unsubscribe(pool: &PgPool, viewer_id: Uuid, creator_id: Uuid) -> Result<SubscriptionRow, AppError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(
        "DELETE FROM subscriptions WHERE viewer_id = $1 AND creator_id = $2 RETURNING *",
    )
    .bind(viewer_id)
    .bind(creator_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Subscription")
}
