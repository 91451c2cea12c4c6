//! User service: accounts, sessions, profile media, watch history.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use playtube_common::{
    AppError, AppResult, IdGenerator, MediaHost, SessionTokens, TempMedia, TokenManager,
};
use playtube_db::{
    entities::user,
    repositories::{UserRepository, VideoRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::video::OwnerProfile;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    video_repo: VideoRepository,
    media_host: Arc<dyn MediaHost>,
    tokens: TokenManager,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 256))]
    pub full_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for logging in. Either `username` or `email` must be present.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Input for updating account details.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountInput {
    #[validate(length(min = 1, max = 256))]
    pub full_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,
}

/// A watch-history entry: the video plus its owner's trimmed profile.
#[derive(Debug, Clone)]
pub struct WatchedVideo {
    pub video: playtube_db::entities::video::Model,
    pub owner: Option<OwnerProfile>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        video_repo: VideoRepository,
        media_host: Arc<dyn MediaHost>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            user_repo,
            video_repo,
            media_host,
            tokens,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    ///
    /// The avatar is mandatory; the cover image is optional. Both are
    /// pushed to the media host before the user row is created, and the
    /// staged temp files are removed by their guards whichever way this
    /// returns.
    pub async fn register(
        &self,
        input: RegisterInput,
        avatar: &TempMedia,
        cover_image: Option<&TempMedia>,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username_or_email(Some(&input.username), Some(&input.email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let avatar_url = self.media_host.upload(avatar).await?.url;
        let cover_image_url = match cover_image {
            Some(cover) => Some(self.media_host.upload(cover).await?.url),
            None => None,
        };

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            full_name: Set(input.full_name),
            password_hash: Set(password_hash),
            avatar_url: Set(avatar_url),
            cover_image_url: Set(cover_image_url),
            refresh_token: Set(None),
            watch_history: Set(serde_json::json!([])),
            ..Default::default()
        };

        self.user_repo.create(model).await
    }

    /// Authenticate with username-or-email and password, issuing a session.
    ///
    /// Unknown identifier and wrong password produce the same error shape
    /// so callers learn nothing about which half failed.
    pub async fn login(&self, input: LoginInput) -> AppResult<(user::Model, SessionTokens)> {
        if input.username.is_none() && input.email.is_none() {
            return Err(AppError::BadRequest(
                "username or email is required".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_username_or_email(input.username.as_deref(), input.email.as_deref())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = self
            .tokens
            .issue_pair(&user.id, &user.username, &user.email)?;
        self.user_repo
            .set_refresh_token(&user.id, Some(&tokens.refresh_token))
            .await?;

        Ok((user, tokens))
    }

    /// End a session: drop the persisted refresh token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.set_refresh_token(user_id, None).await
    }

    /// Exchange a refresh token for a fresh session pair.
    ///
    /// The presented token must decode, belong to an existing user, and
    /// match the token persisted on that user's record; the stored token
    /// rotates on success.
    pub async fn refresh_session(
        &self,
        presented: &str,
    ) -> AppResult<(user::Model, SessionTokens)> {
        let claims = self.tokens.verify_refresh(presented)?;
        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.refresh_token.as_deref() != Some(presented) {
            return Err(AppError::Unauthorized);
        }

        let tokens = self
            .tokens
            .issue_pair(&user.id, &user.username, &user.email)?;
        self.user_repo
            .set_refresh_token(&user.id, Some(&tokens.refresh_token))
            .await?;

        Ok((user, tokens))
    }

    /// Change the account password.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Invalid old password".to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Update account details (full name, email).
    pub async fn update_account(
        &self,
        user_id: &str,
        input: UpdateAccountInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if let Some(email) = &input.email {
            if let Some(existing) = self.user_repo.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("Email already in use".to_string()));
                }
            }
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email.to_lowercase());
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Replace the avatar with a freshly uploaded file.
    pub async fn update_avatar(&self, user_id: &str, avatar: &TempMedia) -> AppResult<user::Model> {
        let uploaded = self.media_host.upload(avatar).await?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.avatar_url = Set(uploaded.url);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Replace the cover image with a freshly uploaded file.
    pub async fn update_cover_image(
        &self,
        user_id: &str,
        cover_image: &TempMedia,
    ) -> AppResult<user::Model> {
        let uploaded = self.media_host.upload(cover_image).await?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.cover_image_url = Set(Some(uploaded.url));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Get the current user by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Resolve the viewer's watch history to video records, oldest first.
    ///
    /// Videos deleted since they were watched are silently skipped.
    pub async fn watch_history(&self, user_id: &str) -> AppResult<Vec<WatchedVideo>> {
        let ids = self.user_repo.get_watch_history(user_id).await?;
        let videos = self.video_repo.find_by_ids(&ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;

        // Re-order to match the stored history.
        let mut entries = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(video) = videos.iter().find(|v| &v.id == id) {
                let owner = owners
                    .iter()
                    .find(|u| u.id == video.owner_id)
                    .map(|u| OwnerProfile::from(u.clone()));
                entries.push(WatchedVideo {
                    video: video.clone(),
                    owner,
                });
            }
        }

        Ok(entries)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playtube_common::HostedMedia;
    use playtube_common::config::AuthConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct StubMediaHost;

    #[async_trait::async_trait]
    impl MediaHost for StubMediaHost {
        async fn upload(&self, _file: &TempMedia) -> AppResult<HostedMedia> {
            Ok(HostedMedia {
                url: "https://media.example.com/file".to_string(),
                duration: None,
            })
        }
    }

    fn test_tokens() -> TokenManager {
        TokenManager::new(&AuthConfig {
            access_token_secret: "access-secret".to_string(),
            refresh_token_secret: "refresh-secret".to_string(),
            access_token_expiry_secs: 3600,
            refresh_token_expiry_secs: 86_400,
        })
    }

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            full_name: "Test User".to_string(),
            password_hash: hash_password(password).unwrap(),
            avatar_url: "https://media.example.com/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            watch_history: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_service(
        user_db: std::sync::Arc<sea_orm::DatabaseConnection>,
        video_db: std::sync::Arc<sea_orm::DatabaseConnection>,
    ) -> UserService {
        UserService::new(
            UserRepository::new(user_db),
            VideoRepository::new(video_db),
            Arc::new(StubMediaHost),
            test_tokens(),
        )
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_roundtrip() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_unauthorized() {
        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let result = service
            .login(LoginInput {
                username: Some("nobody".to_string()),
                email: None,
                password: "whatever123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let user = create_test_user("u1", "alice", "correct-horse-battery");

        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let result = service
            .login(LoginInput {
                username: Some("alice".to_string()),
                email: None,
                password: "wrong-password".to_string(),
            })
            .await;

        // Same shape as the unknown-user failure.
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_success_persists_refresh_token() {
        let user = create_test_user("u1", "alice", "correct-horse-battery");

        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let (logged_in, tokens) = service
            .login(LoginInput {
                username: Some("alice".to_string()),
                email: None,
                password: "correct-horse-battery".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(logged_in.id, "u1");
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_without_identifier_is_bad_request() {
        let user_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let result = service
            .login(LoginInput {
                username: None,
                email: None,
                password: "whatever123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_refresh_session_mismatched_token_rejected() {
        let tokens = test_tokens();
        let pair = tokens
            .issue_pair("u1", "alice", "alice@example.com")
            .unwrap();

        let mut user = create_test_user("u1", "alice", "pw-irrelevant-1");
        // A different (rotated) token is persisted on the record.
        user.refresh_token = Some("some-other-token".to_string());

        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let result = service.refresh_session(&pair.refresh_token).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_account_taken_email_is_conflict() {
        let other = create_test_user("u2", "bob", "pw-irrelevant-2");

        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[other]])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let result = service
            .update_account(
                "u1",
                UpdateAccountInput {
                    full_name: None,
                    email: Some("bob@example.com".to_string()),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let existing = create_test_user("u1", "alice", "pw-irrelevant-1");

        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let video_db =
            std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_service(user_db, video_db);
        let dir = std::env::temp_dir().join("playtube-user-test");
        let avatar = TempMedia::stage(&dir, "avatar.png", b"png").await.unwrap();

        let result = service
            .register(
                RegisterInput {
                    username: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                    full_name: "Alice".to_string(),
                    password: "password123".to_string(),
                },
                &avatar,
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_input_validation() {
        let input = RegisterInput {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            full_name: "Alice".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
