use axum::{extract::State, Json};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::category::CategoryRow;
use crate::state::AppState;

pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, AppError> {
    Ok(sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?)
}

/// GET /api/v1/categories
pub async fn handle_list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryRow>>, AppError> {
    Ok(Json(list_categories(&state.db).await?))
}
