use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::reaction::ReactionType;

/// What a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Video,
    Comment,
}

impl ReactionTarget {
    fn reaction_table(&self) -> &'static str {
        match self {
            ReactionTarget::Video => "video_reactions",
            ReactionTarget::Comment => "comment_reactions",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            ReactionTarget::Video => "video_id",
            ReactionTarget::Comment => "comment_id",
        }
    }

    /// Target exists and sits on a video the reacting user may see: public,
    /// or their own.
    fn visible_target(&self) -> &'static str {
        match self {
            ReactionTarget::Video => {
                "EXISTS (SELECT 1 FROM videos v \
                 WHERE v.id = $2 AND (v.visibility = 'public' OR v.user_id = $1))"
            }
            ReactionTarget::Comment => {
                "EXISTS (SELECT 1 FROM comments c JOIN videos v ON v.id = c.video_id \
                 WHERE c.id = $2 AND (v.visibility = 'public' OR v.user_id = $1))"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionTarget::Video => "Video",
            ReactionTarget::Comment => "Comment",
        }
    }

    /// Toggle-upsert as a single statement.
    ///
    /// A same-kind row is deleted; otherwise the requested kind is inserted,
    /// replacing an opposite-kind row through the primary key conflict.
    /// Always yields one row: the resulting reaction and whether the target
    /// is visible. Nothing is written for a hidden target.
    fn toggle_sql(&self) -> String {
        let table = self.reaction_table();
        let column = self.target_column();
        let target = self.visible_target();
        format!(
            r#"
            WITH removed AS (
                DELETE FROM {table}
                WHERE user_id = $1 AND {column} = $2 AND type = $3 AND {target}
                RETURNING type
            ), applied AS (
                INSERT INTO {table} (user_id, {column}, type)
                SELECT $1, $2, $3
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                  AND {target}
                ON CONFLICT (user_id, {column})
                DO UPDATE SET type = EXCLUDED.type, updated_at = now()
                RETURNING type
            )
            SELECT (SELECT type FROM applied) AS reaction,
                   {target} AS target_exists
            "#
        )
    }
}

/// The viewer's reaction after a toggle; `None` means it was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionState {
    pub target_id: Uuid,
    pub viewer_reaction: Option<ReactionType>,
}

pub async fn toggle_reaction(
    pool: &PgPool,
    target: ReactionTarget,
    user_id: Uuid,
    target_id: Uuid,
    kind: ReactionType,
) -> Result<ReactionState, AppError> {
    let (reaction, target_exists): (Option<ReactionType>, bool) =
        sqlx::query_as(&target.toggle_sql())
            .bind(user_id)
            .bind(target_id)
            .bind(kind)
            .fetch_one(pool)
            .await?;

    if !target_exists {
        return Err(AppError::NotFound(format!("{} not found", target.label())));
    }

    info!(
        "User {user_id} toggled {} on {} {target_id}: now {:?}",
        kind.as_str(),
        target.label().to_lowercase(),
        reaction.map(|r| r.as_str())
    );

    Ok(ReactionState {
        target_id,
        viewer_reaction: reaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::video::VideoVisibility;
    use crate::test_support::{create_user, create_video, test_pool};

    #[test]
    fn test_toggle_sql_targets_matching_tables() {
        let sql = ReactionTarget::Comment.toggle_sql();
        assert!(sql.contains("DELETE FROM comment_reactions"));
        assert!(sql.contains("ON CONFLICT (user_id, comment_id)"));
        assert!(sql.contains("FROM comments c JOIN videos v ON v.id = c.video_id"));
        assert!(!sql.contains("video_reactions"));
    }

    #[test]
    fn test_toggle_sql_checks_visibility_on_every_branch() {
        let sql = ReactionTarget::Video.toggle_sql();
        assert_eq!(sql.matches("v.visibility = 'public' OR v.user_id = $1").count(), 3);
    }

    async fn reaction_rows(pool: &PgPool, user: Uuid, video: Uuid) -> Vec<ReactionType> {
        sqlx::query_scalar("SELECT type FROM video_reactions WHERE user_id = $1 AND video_id = $2")
            .bind(user)
            .bind(video)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_same_kind_toggles_off_then_on() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let fan = create_user(&pool, "fan").await;
        let video = create_video(&pool, owner, None, VideoVisibility::Public).await;

        let first = toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Like).await.unwrap();
        assert_eq!(first.viewer_reaction, Some(ReactionType::Like));
        let second = toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Like).await.unwrap();
        assert_eq!(second.viewer_reaction, None);
        assert!(reaction_rows(&pool, fan, video).await.is_empty());
        let third = toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Like).await.unwrap();
        assert_eq!(third.viewer_reaction, Some(ReactionType::Like));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_opposite_kind_replaces() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let fan = create_user(&pool, "fan").await;
        let video = create_video(&pool, owner, None, VideoVisibility::Public).await;

        toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Like).await.unwrap();
        let state = toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Dislike).await.unwrap();
        assert_eq!(state.viewer_reaction, Some(ReactionType::Dislike));
        assert_eq!(reaction_rows(&pool, fan, video).await, vec![ReactionType::Dislike]);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_missing_target_is_not_found() {
        let pool = test_pool().await;
        let fan = create_user(&pool, "fan").await;
        let result = toggle_reaction(&pool, ReactionTarget::Comment, fan, Uuid::new_v4(), ReactionType::Like).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_concurrent_opposite_toggles_leave_one_row() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let fan = create_user(&pool, "fan").await;
        let video = create_video(&pool, owner, None, VideoVisibility::Public).await;

        let (like, dislike) = tokio::join!(
            toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Like),
            toggle_reaction(&pool, ReactionTarget::Video, fan, video, ReactionType::Dislike),
        );
        // Either statement may commit last; the final row is whichever did.
        let outcomes = [like.unwrap().viewer_reaction, dislike.unwrap().viewer_reaction];
        let rows = reaction_rows(&pool, fan, video).await;
        assert_eq!(rows.len(), 1);
        assert!(outcomes.contains(&Some(rows[0])));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_private_video_rejects_stranger_reactions() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let stranger = create_user(&pool, "stranger").await;
        let video = create_video(&pool, owner, None, VideoVisibility::Private).await;
        let comment = crate::comments::store::create_comment(&pool, owner, video, None, "secret")
            .await
            .unwrap();

        let on_video = toggle_reaction(&pool, ReactionTarget::Video, stranger, video, ReactionType::Like).await;
        assert!(matches!(on_video, Err(AppError::NotFound(_))));
        let on_comment =
            toggle_reaction(&pool, ReactionTarget::Comment, stranger, comment.id, ReactionType::Like).await;
        assert!(matches!(on_comment, Err(AppError::NotFound(_))));
        assert!(reaction_rows(&pool, stranger, video).await.is_empty());

        let own = toggle_reaction(&pool, ReactionTarget::Video, owner, video, ReactionType::Like)
            .await
            .unwrap();
        assert_eq!(own.viewer_reaction, Some(ReactionType::Like));
    }
}
