use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::reaction::ReactionType;
use crate::models::user::{Author, Channel};
use crate::pagination::{Cursor, Keyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "video_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VideoVisibility {
    Public,
    Private,
}

/// A `videos` row as stored. Media fields are owned by the media pipeline
/// and passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub visibility: VideoVisibility,
    pub mux_status: Option<String>,
    pub mux_asset_id: Option<String>,
    pub mux_upload_id: Option<String>,
    pub mux_playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A video in a listing, with its author and engagement counts.
///
/// `sort_at` is the listing's own ordering timestamp (upload time, time
/// added to a playlist, last viewed, ...) and only feeds the cursor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoCardRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub visibility: VideoVisibility,
    pub mux_status: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub author: Author,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    #[serde(skip_serializing)]
    pub sort_at: DateTime<Utc>,
}

impl Keyed for VideoCardRow {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.sort_at, self.id)
    }
}

/// The watch page: everything needed to render one video for one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoDetailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub visibility: VideoVisibility,
    pub mux_status: Option<String>,
    pub mux_playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub channel: Channel,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub viewer_reaction: Option<ReactionType>,
}

/// Row written when a viewer watches a video.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoViewRow {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
