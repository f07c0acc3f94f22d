use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// User lifecycle events pushed by the identity provider.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IdentityEvent {
    #[serde(rename = "user.created")]
    Created(IdentityUser),
    #[serde(rename = "user.updated")]
    Updated(IdentityUser),
    #[serde(rename = "user.deleted")]
    Deleted(DeletedIdentity),
}

#[derive(Debug, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

impl IdentityUser {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            "Anonymous".to_string()
        } else {
            name
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeletedIdentity {
    pub id: String,
}

/// Checks the hex HMAC-SHA256 of the raw body in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> Result<(), AppError> {
    let signature = hex::decode(signature_hex.trim()).map_err(|_| AppError::Unauthorized)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC error: {e}")))?;
    mac.update(body);
    mac.verify_slice(&signature).map_err(|_| AppError::Unauthorized)
}

/// POST /api/v1/webhooks/identity
pub async fn handle_identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    if let Err(e) = verify_signature(&state.config.identity_webhook_secret, &body, signature) {
        warn!("Identity webhook signature rejected");
        return Err(e);
    }

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed identity event: {e}")))?;

    match event {
        IdentityEvent::Created(user) | IdentityEvent::Updated(user) => {
            let row = upsert_user(&state.db, &user).await?;
            info!("Synced user {} from identity {}", row.id, row.external_id);
        }
        IdentityEvent::Deleted(deleted) => {
            let removed = delete_user(&state.db, &deleted.id).await?;
            info!("Removed {removed} user row(s) for identity {}", deleted.id);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upsert_user(pool: &PgPool, user: &IdentityUser) -> Result<UserRow, AppError> {
    Ok(sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (external_id, name, image_url)
        VALUES ($1, $2, $3)
        ON CONFLICT (external_id)
        DO UPDATE SET name = EXCLUDED.name, image_url = EXCLUDED.image_url, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(&user.id)
    .bind(user.display_name())
    .bind(user.image_url.as_deref().unwrap_or_default())
    .fetch_one(pool)
    .await?)
}

pub async fn delete_user(pool: &PgPool, external_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
        .bind(external_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
pub(crate) fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
