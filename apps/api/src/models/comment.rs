use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::reaction::ReactionType;
use crate::models::user::Author;
use crate::pagination::{Cursor, Keyed};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentItemRow {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub author: Author,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
    pub viewer_reaction: Option<ReactionType>,
}

impl Keyed for CommentItemRow {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}
