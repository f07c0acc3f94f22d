use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;

/// Claims the identity provider puts in session tokens.
/// `sub` is the provider's user id (`users.external_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies bearer tokens issued by the identity provider.
#[derive(Clone)]
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Returns the external identity carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation).map_err(|e| {
            warn!("Identity token rejected: {e}");
            AppError::Unauthorized
        })?;
        Ok(data.claims.sub)
    }
}

/// Extracts the bearer token, if any.
///
/// No `Authorization` header means an anonymous request; a header that is
/// present but not a bearer token is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
pub(crate) fn sign_test_token(secret: &str, sub: &str, exp: usize) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = IdentityClaims {
        sub: sub.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "identity-test-secret";

    fn in_one_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = IdentityVerifier::new(SECRET);
        let token = sign_test_token(SECRET, "user_2abc", in_one_hour());
        assert_eq!(verifier.verify(&token).unwrap(), "user_2abc");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = IdentityVerifier::new(SECRET);
        let token = sign_test_token("other-secret", "user_2abc", in_one_hour());
        assert!(matches!(verifier.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = IdentityVerifier::new(SECRET);
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = sign_test_token(SECRET, "user_2abc", expired);
        assert!(matches!(verifier.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_bearer_header_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_header_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));
    }
}
