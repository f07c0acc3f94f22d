use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public author fields embedded in comments, videos and subscriptions.
/// Selected as `author_*` columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    #[sqlx(rename = "author_id")]
    pub id: Uuid,
    #[sqlx(rename = "author_name")]
    pub name: String,
    #[sqlx(rename = "author_image_url")]
    pub image_url: String,
}

/// Author plus channel aggregates and the viewer's subscription state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    #[sqlx(rename = "author_id")]
    pub id: Uuid,
    #[sqlx(rename = "author_name")]
    pub name: String,
    #[sqlx(rename = "author_image_url")]
    pub image_url: String,
    pub subscriber_count: i64,
    pub viewer_subscribed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub viewer_subscribed: bool,
}
