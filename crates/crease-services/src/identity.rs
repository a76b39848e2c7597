//! Caller identity resolution.

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crease_models::UserId;

use crate::error::{ServiceError, ServiceResult};

/// Resolves an opaque credential to a user identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> ServiceResult<UserId>;
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies HS256 session tokens signed with a shared secret.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> ServiceResult<SessionClaims> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(ServiceError::unauthenticated("Missing credential"));
        }

        let data = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| ServiceError::unauthenticated(format!("Token validation failed: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(ServiceError::unauthenticated("Token missing subject"));
        }
        Ok(data.claims)
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credential: &str) -> ServiceResult<UserId> {
        let claims = self.verify(credential)?;
        debug!(user = %claims.sub, "Resolved session token");
        Ok(UserId::new(claims.sub))
    }
}

/// Fixed credential table, for local runs and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    users: HashMap<String, UserId>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, credential: impl Into<String>, user: UserId) -> Self {
        self.users.insert(credential.into(), user);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, credential: &str) -> ServiceResult<UserId> {
        self.users
            .get(credential)
            .cloned()
            .ok_or_else(|| ServiceError::unauthenticated("Unknown credential"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crease_models::BoundaryCode;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn token(sub: &str, iss: Option<&str>, exp_offset: i64) -> String {
        let claims = SessionClaims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iss: iss.map(str::to_string),
            aud: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_bearer_token() {
        let resolver = JwtIdentityResolver::new(SECRET);
        let user = resolver
            .resolve(&format!("Bearer {}", token("user-1", None, 3600)))
            .await
            .unwrap();
        assert_eq!(user, UserId::new("user-1"));
    }

    #[tokio::test]
    async fn test_rejects_bad_tokens() {
        let resolver = JwtIdentityResolver::new(SECRET).with_issuer("crease");

        let err = resolver.resolve("").await.unwrap_err();
        assert_eq!(err.boundary_code(), BoundaryCode::Unauthenticated);

        // wrong issuer
        assert!(resolver.resolve(&token("u", Some("other"), 3600)).await.is_err());
        // expired well past the default leeway
        assert!(resolver.resolve(&token("u", Some("crease"), -3600)).await.is_err());
        // wrong secret
        let other = JwtIdentityResolver::new(b"another-secret");
        assert!(other.resolve(&token("u", None, 3600)).await.is_err());

        assert!(resolver.resolve(&token("u", Some("crease"), 3600)).await.is_ok());
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticIdentityResolver::new().with_user("key-1", UserId::new("alice"));
        assert_eq!(resolver.resolve("key-1").await.unwrap().as_str(), "alice");
        assert!(matches!(
            resolver.resolve("nope").await,
            Err(ServiceError::Unauthenticated(_))
        ));
    }
}
