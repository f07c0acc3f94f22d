use sqlx::PgPool;

use crate::auth::IdentityVerifier;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Verifies identity-provider bearer tokens; see `auth::viewer`.
    pub identity: IdentityVerifier,
}
