use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::guard::found;
use crate::models::playlist::{PlaylistItemRow, PlaylistRow, PlaylistVideoRow};
use crate::models::video::VideoCardRow;
use crate::pagination::{fetch_page, Page, PageParams, SeekKeys};
use crate::videos::store::VIDEO_CARD_COLUMNS;

const PLAYLIST_KEYS: SeekKeys = SeekKeys {
    timestamp: "p.created_at",
    id: "p.id",
};

/// Videos the playlist owner can still see: public ones and their own.
const VISIBLE_TO_OWNER: &str = "(v.visibility = 'public' OR v.user_id = p.user_id)";

fn push_playlist_head(qb: &mut QueryBuilder<'_, Postgres>, contains: Option<Uuid>) {
    qb.push(
        "SELECT p.id, p.user_id, p.name, p.description, p.created_at, p.updated_at, \
         (SELECT COUNT(*) FROM playlist_videos pv JOIN videos v ON v.id = pv.video_id \
           WHERE pv.playlist_id = p.id AND ",
    )
    .push(VISIBLE_TO_OWNER)
    .push(
        ") AS video_count, \
         (SELECT v.thumbnail_url FROM playlist_videos pv JOIN videos v ON v.id = pv.video_id \
           WHERE pv.playlist_id = p.id AND ",
    )
    .push(VISIBLE_TO_OWNER)
    .push(" ORDER BY pv.created_at DESC, pv.video_id DESC LIMIT 1) AS thumbnail_url, ");
    match contains {
        Some(video_id) => {
            qb.push("EXISTS (SELECT 1 FROM playlist_videos agg WHERE agg.playlist_id = p.id AND agg.video_id = ")
                .push_bind(video_id)
                .push(") AS contains_video");
        }
        None => {
            qb.push("NULL::boolean AS contains_video");
        }
    }
    qb.push(" FROM playlists p");
}

/// The owner's playlists, newest first. With `contains`, each item also
/// says whether that video is already in it.
pub async fn list_playlists(
    pool: &PgPool,
    user_id: Uuid,
    contains: Option<Uuid>,
    params: &PageParams,
) -> Result<Page<PlaylistItemRow>, AppError> {
    fetch_page(
        pool,
        |qb| push_playlist_head(qb, contains),
        "playlists p",
        |qb| {
            qb.push(" AND p.user_id = ").push_bind(user_id);
        },
        PLAYLIST_KEYS,
        params,
    )
    .await
}

pub async fn get_playlist(pool: &PgPool, user_id: Uuid, playlist_id: Uuid) -> Result<PlaylistRow, AppError> {
    let row = sqlx::query_as::<_, PlaylistRow>("SELECT * FROM playlists WHERE id = $1 AND user_id = $2")
        .bind(playlist_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    found(row, "Playlist")
}

/// Videos in one of the owner's playlists, most recently added first.
pub async fn list_playlist_videos(
    pool: &PgPool,
    user_id: Uuid,
    playlist_id: Uuid,
    params: &PageParams,
) -> Result<Page<VideoCardRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push("SELECT ")
                .push(VIDEO_CARD_COLUMNS)
                .push(
                    ", pv.created_at AS sort_at FROM playlist_videos pv \
                     JOIN playlists p ON p.id = pv.playlist_id \
                     JOIN videos v ON v.id = pv.video_id \
                     JOIN users u ON u.id = v.user_id",
                );
        },
        "playlist_videos pv JOIN playlists p ON p.id = pv.playlist_id JOIN videos v ON v.id = pv.video_id",
        |qb| {
            qb.push(" AND pv.playlist_id = ")
                .push_bind(playlist_id)
                .push(" AND p.user_id = ")
                .push_bind(user_id)
                .push(" AND ")
                .push(VISIBLE_TO_OWNER);
        },
        SeekKeys {
            timestamp: "pv.created_at",
            id: "v.id",
        },
        params,
    )
    .await
}

/// Videos the viewer watched, most recently viewed first.
pub async fn list_history(pool: &PgPool, user_id: Uuid, params: &PageParams) -> Result<Page<VideoCardRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push("SELECT ")
                .push(VIDEO_CARD_COLUMNS)
                .push(
                    ", vv.updated_at AS sort_at FROM video_views vv \
                     JOIN videos v ON v.id = vv.video_id \
                     JOIN users u ON u.id = v.user_id",
                );
        },
        "video_views vv JOIN videos v ON v.id = vv.video_id",
        |qb| {
            qb.push(" AND vv.user_id = ")
                .push_bind(user_id)
                .push(" AND (v.visibility = 'public' OR v.user_id = ")
                .push_bind(user_id)
                .push(")");
        },
        SeekKeys {
            timestamp: "vv.updated_at",
            id: "v.id",
        },
        params,
    )
    .await
}

/// Videos the viewer currently likes, most recently liked first.
pub async fn list_liked(pool: &PgPool, user_id: Uuid, params: &PageParams) -> Result<Page<VideoCardRow>, AppError> {
    fetch_page(
        pool,
        |qb| {
            qb.push("SELECT ")
                .push(VIDEO_CARD_COLUMNS)
                .push(
                    ", vr.updated_at AS sort_at FROM video_reactions vr \
                     JOIN videos v ON v.id = vr.video_id \
                     JOIN users u ON u.id = v.user_id",
                );
        },
        "video_reactions vr JOIN videos v ON v.id = vr.video_id",
        |qb| {
            qb.push(" AND vr.type = 'like' AND vr.user_id = ")
                .push_bind(user_id)
                .push(" AND (v.visibility = 'public' OR v.user_id = ")
                .push_bind(user_id)
                .push(")");
        },
        SeekKeys {
            timestamp: "vr.updated_at",
            id: "v.id",
        },
        params,
    )
    .await
}

pub async fn create_playlist(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<PlaylistRow, AppError> {
    let row = sqlx::query_as::<_, PlaylistRow>(
        "INSERT INTO playlists (user_id, name, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    info!("User {user_id} created playlist {}", row.id);
    Ok(row)
}

pub async fn delete_playlist(pool: &PgPool, user_id: Uuid, playlist_id: Uuid) -> Result<PlaylistRow, AppError> {
    let row = sqlx::query_as::<_, PlaylistRow>(
        "DELETE FROM playlists WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(playlist_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Playlist")
}

/// Adds a video to one of the owner's playlists. Adding it again keeps its
/// original position and only touches `updated_at`.
pub async fn add_video(
    pool: &PgPool,
    user_id: Uuid,
    playlist_id: Uuid,
    video_id: Uuid,
) -> Result<PlaylistVideoRow, AppError> {
    let row = sqlx::query_as::<_, PlaylistVideoRow>(
        r#"
        INSERT INTO playlist_videos (playlist_id, video_id)
        SELECT p.id, v.id
        FROM playlists p, videos v
        WHERE p.id = $1 AND p.user_id = $2
          AND v.id = $3 AND (v.visibility = 'public' OR v.user_id = $2)
        ON CONFLICT (playlist_id, video_id) DO UPDATE SET updated_at = now()
        RETURNING *
        "#,
    )
    .bind(playlist_id)
    .bind(user_id)
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Playlist or video")
}

pub async fn remove_video(
    pool: &PgPool,
    user_id: Uuid,
    playlist_id: Uuid,
    video_id: Uuid,
) -> Result<PlaylistVideoRow, AppError> {
    let row = sqlx::query_as::<_, PlaylistVideoRow>(
        r#"
        DELETE FROM playlist_videos pv
        USING playlists p
        WHERE pv.playlist_id = p.id AND p.id = $1 AND p.user_id = $2 AND pv.video_id = $3
        RETURNING pv.*
        "#,
    )
    .bind(playlist_id)
    .bind(user_id)
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    found(row, "Playlist video")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::video::VideoVisibility;
    use crate::test_support::{create_user, create_video, test_pool};

    #[test]
    fn test_contains_column_only_when_asked() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_playlist_head(&mut qb, None);
        assert!(qb.sql().contains("NULL::boolean AS contains_video"));

        let mut qb = QueryBuilder::<Postgres>::new("");
        push_playlist_head(&mut qb, Some(Uuid::new_v4()));
        assert!(qb.sql().contains("agg.video_id = $1) AS contains_video"));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_add_is_idempotent_and_counted_once() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let video = create_video(&pool, owner, None, VideoVisibility::Public).await;
        let playlist = create_playlist(&pool, owner, "Later", None).await.unwrap();

        add_video(&pool, owner, playlist.id, video).await.unwrap();
        add_video(&pool, owner, playlist.id, video).await.unwrap();

        let page = list_playlists(&pool, owner, Some(video), &PageParams::first(10))
            .await
            .unwrap();
        let item = page.items.iter().find(|p| p.id == playlist.id).unwrap();
        assert_eq!(item.video_count, 1);
        assert_eq!(item.contains_video, Some(true));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_foreign_playlist_behaves_as_missing() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let intruder = create_user(&pool, "intruder").await;
        let video = create_video(&pool, intruder, None, VideoVisibility::Public).await;
        let playlist = create_playlist(&pool, owner, "Mine", None).await.unwrap();

        assert!(matches!(
            add_video(&pool, intruder, playlist.id, video).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            get_playlist(&pool, intruder, playlist.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_playlist(&pool, intruder, playlist.id).await,
            Err(AppError::NotFound(_))
        ));
        let page = list_playlist_videos(&pool, intruder, playlist.id, &PageParams::first(10))
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_history_orders_by_last_view() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let fan = create_user(&pool, "fan").await;
        let first = create_video(&pool, owner, None, VideoVisibility::Public).await;
        let second = create_video(&pool, owner, None, VideoVisibility::Public).await;

        crate::videos::store::record_view(&pool, fan, first).await.unwrap();
        crate::videos::store::record_view(&pool, fan, second).await.unwrap();
        crate::videos::store::record_view(&pool, fan, first).await.unwrap();

        let page = list_history(&pool, fan, &PageParams::first(10)).await.unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn test_re_adding_keeps_original_position() {
        let pool = test_pool().await;
        let owner = create_user(&pool, "owner").await;
        let a = create_video(&pool, owner, None, VideoVisibility::Public).await;
        let b = create_video(&pool, owner, None, VideoVisibility::Public).await;
        let playlist = create_playlist(&pool, owner, "Queue", None).await.unwrap();

        add_video(&pool, owner, playlist.id, a).await.unwrap();
        add_video(&pool, owner, playlist.id, b).await.unwrap();
        add_video(&pool, owner, playlist.id, a).await.unwrap();

        let page = list_playlist_videos(&pool, owner, playlist.id, &PageParams::first(10))
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b, a]);
    }
}
