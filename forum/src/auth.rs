//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs carrying the username, display name and role. The
//! middleware verifies the token and exposes the caller as an [`AuthUser`] extension.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use forum_core::models::{Identity, Role};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Payload stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Username
    pub sub: String,
    pub display_name: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            username: claims.sub,
            display_name: claims.display_name,
            role: claims.role,
        }
    }
}

/// Issues and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> ApiResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Internal(format!("System time error: {e}")))?
            .as_secs();

        let claims = Claims {
            sub: identity.username.clone(),
            display_name: identity.display_name.clone(),
            role: identity.role,
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {e}")))
    }

    pub fn verify(&self, token: &str) -> ApiResult<Identity> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.into())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired".to_string()),
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            })
    }
}

/// The authenticated caller, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Reject requests without a valid bearer token
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

    let identity = state.tokens.verify(token)?;
    debug!(username = %identity.username, "Authenticated request");

    req.extensions_mut().insert(AuthUser(identity));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn alice() -> Identity {
        Identity {
            username: "alice".into(),
            display_name: "Alice".into(),
            role: Role::User,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let token = issuer.issue(&alice()).unwrap();

        assert_eq!(issuer.verify(&token).unwrap(), alice());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new(SECRET, Duration::from_secs(60))
            .issue(&alice())
            .unwrap();
        let other = TokenIssuer::new("another-secret-that-is-long-enough-too", Duration::from_secs(60));

        assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized(_))));
        assert!(matches!(other.verify("garbage"), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "alice".into(),
            display_name: "Alice".into(),
            role: Role::User,
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = TokenIssuer::new(SECRET, Duration::from_secs(60))
            .verify(&token)
            .unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }
}
