//! Tweet service.

use playtube_common::{AppError, AppResult, IdGenerator, is_valid_id};
use playtube_db::{
    entities::tweet,
    repositories::{TweetRepository, UserRepository},
};
use sea_orm::Set;

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub fn new(tweet_repo: TweetRepository, user_repo: UserRepository) -> Self {
        Self {
            tweet_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a tweet.
    pub async fn create(&self, owner_id: &str, content: &str) -> AppResult<tweet::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Cannot create an empty tweet".to_string(),
            ));
        }

        let model = tweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            content: Set(content.trim().to_string()),
            ..Default::default()
        };

        self.tweet_repo.create(model).await
    }

    /// Tweets by a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<tweet::Model>> {
        if !is_valid_id(user_id) {
            return Err(AppError::BadRequest("Invalid user ID".to_string()));
        }
        self.user_repo.get_by_id(user_id).await?;

        let limit = limit.clamp(1, 100);
        let offset = page.saturating_sub(1) * limit;
        self.tweet_repo.find_by_owner(user_id, limit, offset).await
    }

    /// Update a tweet's content. Owner-scoped.
    pub async fn update(
        &self,
        tweet_id: &str,
        owner_id: &str,
        content: &str,
    ) -> AppResult<tweet::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Cannot store an empty tweet".to_string(),
            ));
        }

        let tweet = self.tweet_repo.get_by_id(tweet_id).await?;
        if tweet.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can update a tweet".to_string(),
            ));
        }

        let mut active: tweet::ActiveModel = tweet.into();
        active.content = Set(content.trim().to_string());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.tweet_repo.update(active).await
    }

    /// Delete a tweet. Owner-scoped.
    pub async fn delete(&self, tweet_id: &str, owner_id: &str) -> AppResult<()> {
        let tweet = self.tweet_repo.get_by_id(tweet_id).await?;
        if tweet.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete a tweet".to_string(),
            ));
        }

        self.tweet_repo.delete_by_id(tweet_id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_tweet(id: &str, owner_id: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            content: "hello world".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_empty_content_rejected() {
        let service = TweetService::new(
            TweetRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            UserRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
        );

        let result = service.create("u1", "  ").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_rejects_non_owner() {
        let tweet = create_test_tweet("t1", "u1");

        let tweet_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tweet]])
                .into_connection(),
        );

        let service = TweetService::new(
            TweetRepository::new(tweet_db),
            UserRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
        );

        let result = service.delete("t1", "intruder").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
