use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::guard::found;
use crate::models::video::{VideoCardRow, VideoDetailRow, VideoRow, VideoViewRow, VideoVisibility};
use crate::pagination::{fetch_page, Page, PageParams, SeekKeys};

/// Select list shared by every video listing. The caller adds `sort_at`
/// and joins `videos v` to `users u`.
pub const VIDEO_CARD_COLUMNS: &str = "v.id, v.user_id, v.category_id, v.title, v.description, \
     v.visibility, v.mux_status, v.thumbnail_url, v.preview_url, v.duration, \
     v.created_at, v.updated_at, \
     u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url, \
     (SELECT COUNT(*) FROM video_views agg WHERE agg.video_id = v.id) AS view_count, \
     (SELECT COUNT(*) FROM video_reactions agg \
       WHERE agg.video_id = v.id AND agg.type = 'like') AS like_count, \
     (SELECT COUNT(*) FROM video_reactions agg \
       WHERE agg.video_id = v.id AND agg.type = 'dislike') AS dislike_count";

const UPLOAD_KEYS: SeekKeys = SeekKeys {
    timestamp: "v.created_at",
    id: "v.id",
};

/// The video listings ordered by upload time.
#[derive(Debug, Clone)]
pub enum VideoFeed {
    /// Public videos, optionally narrowed to a category and/or a channel.
    Public {
        category_id: Option<Uuid>,
        user_id: Option<Uuid>,
    },
    /// Public videos from creators the viewer subscribes to.
    Subscribed { viewer_id: Uuid },
    /// Everything a creator uploaded, private included.
    Studio { owner_id: Uuid },
    /// Public videos whose title matches an escaped `ILIKE` pattern.
    Search {
        pattern: Option<String>,
        category_id: Option<Uuid>,
    },
    /// Public videos related to `video_id`, excluding it.
    Suggestions {
        video_id: Uuid,
        category_id: Option<Uuid>,
    },
}

impl VideoFeed {
    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            VideoFeed::Public {
                category_id,
                user_id,
            } => {
                qb.push(" AND v.visibility = 'public'");
                if let Some(category_id) = category_id {
                    qb.push(" AND v.category_id = ").push_bind(*category_id);
                }
                if let Some(user_id) = user_id {
                    qb.push(" AND v.user_id = ").push_bind(*user_id);
                }
            }
            VideoFeed::Subscribed { viewer_id } => {
                qb.push(" AND v.visibility = 'public'")
                    .push(" AND v.user_id IN (SELECT creator_id FROM subscriptions WHERE viewer_id = ")
                    .push_bind(*viewer_id)
                    .push(")");
            }
            VideoFeed::Studio { owner_id } => {
                qb.push(" AND v.user_id = ").push_bind(*owner_id);
            }
            VideoFeed::Search {
                pattern,
                category_id,
            } => {
                qb.push(" AND v.visibility = 'public'");
                if let Some(pattern) = pattern {
                    qb.push(" AND v.title ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'");
                }
                if let Some(category_id) = category_id {
                    qb.push(" AND v.category_id = ").push_bind(*category_id);
                }
            }
            VideoFeed::Suggestions {
                video_id,
                category_id,
            } => {
                qb.push(" AND v.visibility = 'public' AND v.id <> ")
                    .push_bind(*video_id);
                if let Some(category_id) = category_id {
                    qb.push(" AND v.category_id = ").push_bind(*category_id);
                }
            }
        }
    }
}

pub async fn list_videos(
    pool: &PgPool,
    feed: &VideoFeed,
    params: &PageParams,
) -> Result<Page<VideoCardRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push("SELECT ")
                .push(VIDEO_CARD_COLUMNS)
                .push(", v.created_at AS sort_at FROM videos v JOIN users u ON u.id = v.user_id");
        },
        "videos v",
        |qb| feed.push_scope(qb),
        UPLOAD_KEYS,
        params,
    )
    .await
}

/// The watch page for one video.
///
/// Private videos only resolve for their owner; anyone else gets the same
/// `NotFound` as for a missing id.
pub async fn get_video(
    pool: &PgPool,
    video_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<VideoDetailRow, AppError> {
    let row = sqlx::query_as::<_, VideoDetailRow>(
        r#"
        WITH viewer_reactions AS (
            SELECT video_id, type FROM video_reactions WHERE user_id = $1
        ), viewer_subscriptions AS (
            SELECT creator_id FROM subscriptions WHERE viewer_id = $1
        )
        SELECT v.id, v.user_id, v.category_id, v.title, v.description, v.visibility,
               v.mux_status, v.mux_playback_id, v.thumbnail_url, v.preview_url, v.duration,
               v.created_at, v.updated_at,
               u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url,
               (SELECT COUNT(*) FROM subscriptions agg WHERE agg.creator_id = u.id) AS subscriber_count,
               (vs.creator_id IS NOT NULL) AS viewer_subscribed,
               (SELECT COUNT(*) FROM video_views agg WHERE agg.video_id = v.id) AS view_count,
               (SELECT COUNT(*) FROM video_reactions agg
                 WHERE agg.video_id = v.id AND agg.type = 'like') AS like_count,
               (SELECT COUNT(*) FROM video_reactions agg
                 WHERE agg.video_id = v.id AND agg.type = 'dislike') AS dislike_count,
               vr.type AS viewer_reaction
        FROM videos v
        JOIN users u ON u.id = v.user_id
        LEFT JOIN viewer_reactions vr ON vr.video_id = v.id
        LEFT JOIN viewer_subscriptions vs ON vs.creator_id = u.id
        WHERE v.id = $2 AND (v.visibility = 'public' OR v.user_id = $1)
        "#,
    )
    .bind(viewer_id)
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Video")
}

/// Category of a video the viewer may see; drives suggestions.
pub async fn visible_video_category(
    pool: &PgPool,
    video_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<Uuid>, AppError> {
    let row: Option<Option<Uuid>> = sqlx::query_scalar(
        "SELECT category_id FROM videos WHERE id = $1 AND (visibility = 'public' OR user_id = $2)",
    )
    .bind(video_id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Video")
}

pub struct NewVideo<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category_id: Option<Uuid>,
    pub visibility: VideoVisibility,
}

/// Creates a draft video owned by `user_id`. Media fields stay empty until
/// the media pipeline fills them in.
pub async fn create_video(
    pool: &PgPool,
    user_id: Uuid,
    video: NewVideo<'_>,
) -> Result<VideoRow, AppError> {
    let row = sqlx::query_as::<_, VideoRow>(
        r#"
        INSERT INTO videos (user_id, title, description, category_id, visibility)
        SELECT $1, $2, $3, $4, $5
        WHERE $4::uuid IS NULL OR EXISTS (SELECT 1 FROM categories WHERE id = $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(video.title)
    .bind(video.description)
    .bind(video.category_id)
    .bind(video.visibility)
    .fetch_optional(pool)
    .await?;

    let row = found(row, "Category")?;
    info!("User {user_id} created video {}", row.id);
    Ok(row)
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Default)]
pub struct VideoChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category_id: Option<Uuid>,
    pub visibility: Option<VideoVisibility>,
}

pub async fn update_video(
    pool: &PgPool,
    user_id: Uuid,
    video_id: Uuid,
    changes: VideoChanges<'_>,
) -> Result<VideoRow, AppError> {
    if let Some(category_id) = changes.category_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(category_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
    }

    let row = sqlx::query_as::<_, VideoRow>(
        r#"
        UPDATE videos SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            category_id = COALESCE($3, category_id),
            visibility = COALESCE($4, visibility),
            updated_at = now()
        WHERE id = $5 AND user_id = $6
          AND ($3::uuid IS NULL OR EXISTS (SELECT 1 FROM categories WHERE id = $3))
        RETURNING *
        "#,
    )
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.category_id)
    .bind(changes.visibility)
    .bind(video_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Video")
}

pub async fn delete_video(pool: &PgPool, user_id: Uuid, video_id: Uuid) -> Result<VideoRow, AppError> {
    let row = sqlx::query_as::<_, VideoRow>(
        "DELETE FROM videos WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(video_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let row = found(row, "Video")?;
    info!("User {user_id} deleted video {video_id}");
    Ok(row)
}

/// Records that `user_id` watched a video, bumping the last-viewed time on
/// repeat views. Counts one view per viewer.
pub async fn record_view(pool: &PgPool, user_id: Uuid, video_id: Uuid) -> Result<VideoViewRow, AppError> {
    let row = sqlx::query_as::<_, VideoViewRow>(
        r#"
        INSERT INTO video_views (user_id, video_id)
        SELECT $1, $2
        WHERE EXISTS (
            SELECT 1 FROM videos
            WHERE id = $2 AND (visibility = 'public' OR user_id = $1))
        ON CONFLICT (user_id, video_id) DO UPDATE SET updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Video")
}
