// crates/server/src/auth.rs
//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the external identity provider. The `sub`
//! claim is the caller's user id and `exp` is mandatory. Handlers take an
//! [`AuthUser`] argument, so a request without a valid token is rejected with
//! 401 before any handler code (and any datastore access) runs.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies bearer tokens against the shared secret.
#[derive(Clone)]
pub struct Authenticator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("issuer", &self.validation.iss)
            .field("audience", &self.validation.aud)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(secret: &[u8], issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate `token` and return the caller's user id.
    pub fn verify(&self, token: &str) -> ApiResult<String> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;
        if data.claims.sub.trim().is_empty() {
            return Err(ApiError::Unauthenticated("empty subject".into()));
        }
        Ok(data.claims.sub)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl AuthUser {
    /// Reject access to another user's data.
    pub fn ensure_owns(&self, user_id: &str) -> ApiResult<()> {
        if self.user_id == user_id {
            Ok(())
        } else {
            tracing::warn!(
                caller = %self.user_id,
                requested = %user_id,
                "Cross-user access denied"
            );
            Err(ApiError::Forbidden(
                "cannot access another user's data".into(),
            ))
        }
    }
}

fn bearer_token(parts: &Parts) -> ApiResult<&str> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthenticated("missing Authorization header".into()))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("malformed Authorization header".into()))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ApiError::Unauthenticated("expected a bearer token".into())),
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = state.auth.verify(token)?;
        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    fn token(claims: &Claims, secret: &[u8]) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.into(),
            exp: now() + 3600,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let auth = Authenticator::new(SECRET, None, None);
        assert_eq!(auth.verify(&token(&claims("u1"), SECRET)).unwrap(), "u1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = Authenticator::new(SECRET, None, None);
        let err = auth.verify(&token(&claims("u1"), b"other")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = Authenticator::new(SECRET, None, None);
        let expired = Claims {
            exp: now() - 3600,
            ..claims("u1")
        };
        assert!(auth.verify(&token(&expired, SECRET)).is_err());
    }

    #[test]
    fn test_issuer_and_audience_enforced_when_configured() {
        let auth = Authenticator::new(SECRET, Some("idp"), Some("cogtrain"));
        assert!(auth.verify(&token(&claims("u1"), SECRET)).is_err());

        let good = Claims {
            iss: Some("idp".into()),
            aud: Some("cogtrain".into()),
            ..claims("u1")
        };
        assert_eq!(auth.verify(&token(&good, SECRET)).unwrap(), "u1");
    }

    #[test]
    fn test_audience_ignored_when_not_configured() {
        let auth = Authenticator::new(SECRET, None, None);
        let with_aud = Claims {
            aud: Some("anything".into()),
            ..claims("u1")
        };
        assert!(auth.verify(&token(&with_aud, SECRET)).is_ok());
    }

    #[test]
    fn test_blank_subject_rejected() {
        let auth = Authenticator::new(SECRET, None, None);
        assert!(auth.verify(&token(&claims("  "), SECRET)).is_err());
    }

    #[test]
    fn test_ensure_owns() {
        let caller = AuthUser {
            user_id: "u1".into(),
        };
        assert!(caller.ensure_owns("u1").is_ok());
        assert!(matches!(
            caller.ensure_owns("u2"),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = |value: &str| {
            let (parts, _) = axum::http::Request::builder()
                .header(header::AUTHORIZATION, value)
                .body(())
                .unwrap()
                .into_parts();
            parts
        };
        assert_eq!(bearer_token(&parts("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&parts("bearer abc")).unwrap(), "abc");
        assert!(bearer_token(&parts("Basic abc")).is_err());
        assert!(bearer_token(&parts("Bearer ")).is_err());
    }
}
