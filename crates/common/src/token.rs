//! JWT session tokens.
//!
//! Sessions use a short-lived access token plus a longer-lived refresh
//! token, both HS256-signed. The refresh token is persisted on the user
//! record and compared on refresh, so a stolen-but-rotated token is
//! rejected.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::{AppError, AppResult};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID.
    pub sub: String,
    /// Username at issue time.
    pub username: String,
    /// Email at issue time.
    pub email: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Short-lived access token.
    pub access_token: String,
    /// Longer-lived refresh token.
    pub refresh_token: String,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_secs: i64,
    refresh_expiry_secs: i64,
}

impl TokenManager {
    /// Create a token manager from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_expiry_secs: config.access_token_expiry_secs,
            refresh_expiry_secs: config.refresh_token_expiry_secs,
        }
    }

    /// Issue an access/refresh token pair for a user.
    pub fn issue_pair(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
    ) -> AppResult<SessionTokens> {
        let now = Utc::now().timestamp();

        let access = AccessClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            exp: now + self.access_expiry_secs,
            iat: now,
        };
        let refresh = RefreshClaims {
            sub: user_id.to_string(),
            exp: now + self.refresh_expiry_secs,
            iat: now,
        };

        let access_token = encode(&Header::default(), &access, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))?;
        let refresh_token = encode(&Header::default(), &refresh, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {e}")))?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token, returning its claims.
    ///
    /// Expired, malformed, and wrongly-signed tokens all map to the same
    /// `Unauthorized` error.
    pub fn verify_access(&self, token: &str) -> AppResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Verify a refresh token, returning its claims.
    pub fn verify_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Access token lifetime in seconds (for cookie max-age).
    #[must_use]
    pub const fn access_expiry_secs(&self) -> i64 {
        self.access_expiry_secs
    }

    /// Refresh token lifetime in seconds (for cookie max-age).
    #[must_use]
    pub const fn refresh_expiry_secs(&self) -> i64 {
        self.refresh_expiry_secs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret".to_string(),
            refresh_token_secret: "refresh-secret".to_string(),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 86_400,
        }
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let manager = TokenManager::new(&test_config());
        let tokens = manager
            .issue_pair("user1", "alice", "alice@example.com")
            .unwrap();

        let access = manager.verify_access(&tokens.access_token).unwrap();
        assert_eq!(access.sub, "user1");
        assert_eq!(access.username, "alice");
        assert_eq!(access.email, "alice@example.com");

        let refresh = manager.verify_refresh(&tokens.refresh_token).unwrap();
        assert_eq!(refresh.sub, "user1");
    }

    #[test]
    fn test_access_token_rejected_by_refresh_key() {
        let manager = TokenManager::new(&test_config());
        let tokens = manager
            .issue_pair("user1", "alice", "alice@example.com")
            .unwrap();

        // The two token kinds are signed with different secrets.
        assert!(manager.verify_refresh(&tokens.access_token).is_err());
        assert!(manager.verify_access(&tokens.refresh_token).is_err());
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let manager = TokenManager::new(&test_config());
        match manager.verify_access("not-a-jwt") {
            Err(AppError::Unauthorized) => {}
            other => panic!("Expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let config = AuthConfig {
            access_token_expiry_secs: -120,
            ..test_config()
        };
        let manager = TokenManager::new(&config);
        let tokens = manager
            .issue_pair("user1", "alice", "alice@example.com")
            .unwrap();

        assert!(matches!(
            manager.verify_access(&tokens.access_token),
            Err(AppError::Unauthorized)
        ));
    }
}
