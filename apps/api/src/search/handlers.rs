use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::extract::ValidQuery;
use crate::models::video::VideoCardRow;
use crate::pagination::{Page, PageParams};
use crate::state::AppState;
use crate::videos::store::{self, VideoFeed};

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(max = 200))]
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Wraps `term` as a substring `ILIKE` pattern, escaping `\`, `%` and `_`
/// so they match literally under `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// GET /api/v1/search
pub async fn handle_search(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageParams>,
    ValidQuery(search): ValidQuery<SearchQuery>,
) -> Result<Json<Page<VideoCardRow>>, AppError> {
    let pattern = search
        .query
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(like_pattern);
    let feed = VideoFeed::Search {
        pattern,
        category_id: search.category_id,
    };
    Ok(Json(store::list_videos(&state.db, &feed, &page).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_term_is_substring_match() {
        assert_eq!(like_pattern("rust"), "%rust%");
    }

    #[test]
    fn test_wildcards_are_escaped() {
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_query_length_limit() {
        let ok = SearchQuery {
            query: Some("x".repeat(200)),
            category_id: None,
        };
        assert!(ok.validate().is_ok());
        let too_long = SearchQuery {
            query: Some("x".repeat(201)),
            category_id: None,
        };
        assert!(too_long.validate().is_err());
    }
}
