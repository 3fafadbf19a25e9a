//! Auth Token Validation
//!
//! Validates bearer tokens issued by the external auth service and builds
//! the per-request `AuthContext`. Token issuance, login, and password
//! handling all live with that collaborator; this module only consumes its
//! HS256 tokens.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::Role;
use crate::error::{PlatformError, Result};

/// Auth validation settings, constructed by the binary from environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub issuer: String,
}

impl AuthConfig {
    pub fn new(secret_key: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            issuer: issuer.into(),
        }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub exp: i64,
}

/// Identity resolved for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        Self {
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthContext> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    PlatformError::unauthorized("Token expired")
                }
                _ => PlatformError::unauthorized("Invalid token"),
            })?;

        let claims = data.claims;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| PlatformError::unauthorized(format!("Unknown role: {}", claims.role)))?;

        Ok(AuthContext {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            role,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Role checks shared by the API handlers.
pub mod checks {
    use super::AuthContext;
    use crate::error::{PlatformError, Result};

    pub fn require_admin(auth: &AuthContext) -> Result<()> {
        if auth.role == crate::domain::Role::Admin {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Admin access required"))
        }
    }

    /// Admins and managers.
    pub fn require_staff(auth: &AuthContext) -> Result<()> {
        if auth.role.is_staff() {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Access denied"))
        }
    }

    /// Admins, or the user owning the entity.
    pub fn require_admin_or_owner(auth: &AuthContext, owner_id: &str) -> Result<()> {
        if auth.role == crate::domain::Role::Admin || auth.user_id == owner_id {
            Ok(())
        } else {
            Err(PlatformError::forbidden("Access denied"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(secret: &str, claims: &AccessTokenClaims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(role: &str, exp: i64) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: "user-1".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            role: role.to_string(),
            iss: "eventforge".to_string(),
            exp,
        }
    }

    #[test]
    fn test_validate_token_round_trip() {
        let service = AuthService::new(AuthConfig::new("secret", "eventforge"));
        let token = issue("secret", &claims("manager", chrono::Utc::now().timestamp() + 3600));

        let ctx = service.validate_token(&token).unwrap();
        assert_eq!(ctx.user_id, "user-1");
        assert_eq!(ctx.role, Role::Manager);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let service = AuthService::new(AuthConfig::new("secret", "eventforge"));
        let token = issue("other", &claims("user", chrono::Utc::now().timestamp() + 3600));
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = AuthService::new(AuthConfig::new("secret", "eventforge"));
        let token = issue("secret", &claims("user", chrono::Utc::now().timestamp() - 120));
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_unknown_role() {
        let service = AuthService::new(AuthConfig::new("secret", "eventforge"));
        let token = issue("secret", &claims("root", chrono::Utc::now().timestamp() + 3600));
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
