use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position in a `(timestamp DESC, id DESC)` ordering.
///
/// Only valid against the ordering and scope that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: Uuid) -> Self {
        Self { timestamp, id }
    }
}

/// A row that can hand out the cursor pointing at itself.
pub trait Keyed {
    fn cursor(&self) -> Cursor;
}
