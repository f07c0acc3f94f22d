use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::cursor::{Cursor, Keyed};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Query-string contract shared by all paginated endpoints.
///
/// The cursor travels as two parameters and must be given as a pair.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_cursor_pair"))]
pub struct PageParams {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    pub cursor_timestamp: Option<DateTime<Utc>>,
    pub cursor_id: Option<Uuid>,
}

fn validate_cursor_pair(params: &PageParams) -> Result<(), ValidationError> {
    match (params.cursor_timestamp, params.cursor_id) {
        (Some(_), Some(_)) | (None, None) => Ok(()),
        _ => {
            let mut error = ValidationError::new("cursor");
            error.message = Some("cursor_timestamp and cursor_id must be supplied together".into());
            Err(error)
        }
    }
}

impl PageParams {
    #[cfg(test)]
    pub fn first(limit: i64) -> Self {
        Self {
            limit,
            cursor_timestamp: None,
            cursor_id: None,
        }
    }

    #[cfg(test)]
    pub fn after(cursor: Cursor, limit: i64) -> Self {
        Self {
            limit,
            cursor_timestamp: Some(cursor.timestamp),
            cursor_id: Some(cursor.id),
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        match (self.cursor_timestamp, self.cursor_id) {
            (Some(timestamp), Some(id)) => Some(Cursor::new(timestamp, id)),
            _ => None,
        }
    }

    /// Rows to request from the store: one past the page to detect a next page.
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub next_cursor: Option<Cursor>,
}

impl<T: Keyed> Page<T> {
    /// Builds a page from a `limit + 1` over-fetch.
    ///
    /// If the store returned more than `limit` rows the extra one is dropped
    /// and the cursor points at the new last item; otherwise the listing is
    /// exhausted.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64, total_count: i64) -> Self {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }
        let next_cursor = if has_more {
            rows.last().map(Keyed::cursor)
        } else {
            None
        };

        Page {
            items: rows,
            total_count,
            next_cursor,
        }
    }
}
