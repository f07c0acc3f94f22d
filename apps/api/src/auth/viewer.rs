use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::identity::bearer_token;
use crate::errors::AppError;
use crate::state::AppState;

/// The caller's verified external identity, if a token was sent.
///
/// Extraction only checks the token; it never touches the store. Handlers
/// validate their input first and then resolve the viewer explicitly with
/// [`Identity::viewer`] or [`Identity::require_viewer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub Option<String>);

/// The requester, resolved to an internal `users.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
}

impl Identity {
    /// Maps the external identity to an internal user, once per request.
    /// No token, or no user row for the identity, is an anonymous viewer.
    pub async fn viewer(&self, pool: &PgPool) -> Result<Option<Viewer>, AppError> {
        let Some(external_id) = self.0.as_deref() else {
            return Ok(None);
        };

        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(pool)
            .await?;

        if id.is_none() {
            tracing::debug!("No user row for identity {external_id}; treating as anonymous");
        }
        Ok(id.map(|id| Viewer { id }))
    }

    /// Internal id for viewer-state joins; `None` binds `NULL`, which
    /// matches no rows.
    pub async fn viewer_id(&self, pool: &PgPool) -> Result<Option<Uuid>, AppError> {
        Ok(self.viewer(pool).await?.map(|viewer| viewer.id))
    }

    /// Like [`Identity::viewer`], but an anonymous caller is `Unauthorized`.
    /// A missing token is rejected without a store round trip.
    pub async fn require_viewer(&self, pool: &PgPool) -> Result<Viewer, AppError> {
        if self.0.is_none() {
            return Err(AppError::Unauthorized);
        }
        self.viewer(pool).await?.ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => Ok(Identity(Some(state.identity.verify(token)?))),
            None => Ok(Identity(None)),
        }
    }
}
