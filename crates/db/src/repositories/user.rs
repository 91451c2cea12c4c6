//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use playtube_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by username (case-folded exact match).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email (stored case-folded).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user matching a username or an email.
    pub async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<user::Model>> {
        // An empty OR-condition would match every row.
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let mut condition = Condition::any();
        if let Some(username) = username {
            condition = condition.add(user::Column::UsernameLower.eq(username.to_lowercase()));
        }
        if let Some(email) = email {
            condition = condition.add(user::Column::Email.eq(email.to_lowercase()));
        }

        User::find()
            .filter(condition)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user.
    ///
    /// A unique-index violation on username or email surfaces as `Conflict`.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Username or email already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Username or email already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Set or clear the persisted refresh token (single UPDATE, no fetch).
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        refresh_token: Option<&str>,
    ) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::RefreshToken,
                Expr::value(refresh_token.map(ToString::to_string)),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read a user's watch history as an ordered list of video IDs.
    pub async fn get_watch_history(&self, user_id: &str) -> AppResult<Vec<String>> {
        let user = self.get_by_id(user_id).await?;
        Ok(decode_history(&user.watch_history))
    }

    /// Append a video to a user's watch history if not already present.
    pub async fn append_watch_history(&self, user_id: &str, video_id: &str) -> AppResult<()> {
        let user = self.get_by_id(user_id).await?;
        let mut history = decode_history(&user.watch_history);

        if history.iter().any(|id| id == video_id) {
            return Ok(());
        }
        history.push(video_id.to_string());

        let mut active: user::ActiveModel = user.into();
        active.watch_history = sea_orm::Set(serde_json::json!(history));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a video ID from every user's watch history (single UPDATE).
    pub async fn scrub_watch_history(&self, video_id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::WatchHistory,
                Expr::cust_with_values("watch_history - ?", [video_id]),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let res = User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }
}

/// Decode the JSON watch-history column into an ordered ID list.
fn decode_history(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            full_name: "Test User".to_string(),
            password_hash: "$argon2id$test".to_string(),
            avatar_url: "https://media.example.com/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            watch_history: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("u1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            other => panic!("Expected UserNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_by_username_case_folds() {
        let user = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_username("ALICE").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_append_watch_history_skips_duplicates() {
        let mut user = create_test_user("u1", "alice");
        user.watch_history = serde_json::json!(["v1", "v2"]);

        // Only the lookup query runs; no update is issued for a duplicate.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        repo.append_watch_history("u1", "v2").await.unwrap();
    }

    #[tokio::test]
    async fn test_append_watch_history_appends_new() {
        let mut user = create_test_user("u1", "alice");
        user.watch_history = serde_json::json!(["v1"]);

        let mut updated = user.clone();
        updated.watch_history = serde_json::json!(["v1", "v2"]);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        repo.append_watch_history("u1", "v2").await.unwrap();
    }

    #[test]
    fn test_decode_history_ignores_non_strings() {
        let value = serde_json::json!(["v1", 42, "v2", null]);
        assert_eq!(decode_history(&value), vec!["v1", "v2"]);

        assert!(decode_history(&serde_json::json!({})).is_empty());
    }
}
