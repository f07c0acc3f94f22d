use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::guard::found;
use crate::models::comment::{CommentItemRow, CommentRow};
use crate::pagination::{fetch_page, Page, PageParams, SeekKeys};

const COMMENT_KEYS: SeekKeys = SeekKeys {
    timestamp: "c.created_at",
    id: "c.id",
};

/// Which comments of a video to list.
#[derive(Debug, Clone, Copy)]
pub enum Thread {
    /// Top-level comments.
    Root,
    /// Replies to one comment.
    Replies(Uuid),
}

/// Page of comments on a video with reaction counts, reply counts and the
/// viewer's own reaction. Comments on a private video are only listed for
/// its owner.
pub async fn list_comments(
    pool: &PgPool,
    video_id: Uuid,
    thread: Thread,
    viewer_id: Option<Uuid>,
    params: &PageParams,
) -> Result<Page<CommentItemRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push(
                "WITH viewer_reactions AS (\
                 SELECT comment_id, type FROM comment_reactions WHERE user_id = ",
            )
            .push_bind(viewer_id)
            .push(
                ") SELECT c.*, \
                 u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url, \
                 (SELECT COUNT(*) FROM comment_reactions agg \
                   WHERE agg.comment_id = c.id AND agg.type = 'like') AS like_count, \
                 (SELECT COUNT(*) FROM comment_reactions agg \
                   WHERE agg.comment_id = c.id AND agg.type = 'dislike') AS dislike_count, \
                 (SELECT COUNT(*) FROM comments replies WHERE replies.parent_id = c.id) AS reply_count, \
                 vr.type AS viewer_reaction \
                 FROM comments c \
                 JOIN users u ON u.id = c.user_id \
                 LEFT JOIN viewer_reactions vr ON vr.comment_id = c.id",
            );
        },
        "comments c",
        |qb| {
            qb.push(" AND c.video_id = ")
                .push_bind(video_id)
                .push(
                    " AND EXISTS (SELECT 1 FROM videos v WHERE v.id = c.video_id \
                     AND (v.visibility = 'public' OR v.user_id = ",
                )
                .push_bind(viewer_id)
                .push("))");
            match thread {
                Thread::Root => {
                    qb.push(" AND c.parent_id IS NULL");
                }
                Thread::Replies(parent_id) => {
                    qb.push(" AND c.parent_id = ").push_bind(parent_id);
                }
            }
        },
        COMMENT_KEYS,
        params,
    )
    .await
}

/// Inserts a comment owned by `user_id`.
///
/// The video (and the parent, for a reply) is checked in the same
/// statement. Replies may only target a top-level comment on the same video.
pub async fn create_comment(
    pool: &PgPool,
    user_id: Uuid,
    video_id: Uuid,
    parent_id: Option<Uuid>,
    value: &str,
) -> Result<CommentRow, AppError> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        INSERT INTO comments (user_id, video_id, parent_id, value)
        SELECT $1, $2, $3, $4
        WHERE EXISTS (
                SELECT 1 FROM videos
                WHERE id = $2 AND (visibility = 'public' OR user_id = $1))
          AND ($3::uuid IS NULL OR EXISTS (
                SELECT 1 FROM comments p
                WHERE p.id = $3 AND p.video_id = $2 AND p.parent_id IS NULL))
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .bind(parent_id)
    .bind(value)
    .fetch_optional(pool)
    .await?;

    let row = found(row, "Video or parent comment")?;
    info!("User {user_id} commented {} on video {video_id}", row.id);
    Ok(row)
}

pub async fn update_comment(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
    value: &str,
) -> Result<CommentRow, AppError> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        UPDATE comments SET value = $1, updated_at = now()
        WHERE id = $2 AND user_id = $3
        RETURNING *
        "#,
    )
    .bind(value)
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Comment")
}

/// Deletes a comment and, through the foreign key, its replies.
pub async fn delete_comment(
    pool: &PgPool,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<CommentRow, AppError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "DELETE FROM comments WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let row = found(row, "Comment")?;
    info!("User {user_id} deleted comment {comment_id}");
    Ok(row)
}
