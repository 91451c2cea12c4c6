//! Tweet repository.

use std::sync::Arc;

use crate::entities::{Tweet, tweet};
use playtube_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Tweet repository for database operations.
#[derive(Clone)]
pub struct TweetRepository {
    db: Arc<DatabaseConnection>,
}

impl TweetRepository {
    /// Create a new tweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tweet::Model>> {
        Tweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a tweet by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tweet::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet {id} not found")))
    }

    /// Create a tweet.
    pub async fn create(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a tweet.
    pub async fn update(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tweet.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let res = Tweet::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Tweets by a user, newest first (paginated).
    pub async fn find_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<tweet::Model>> {
        Tweet::find()
            .filter(tweet::Column::OwnerId.eq(owner_id))
            .order_by_desc(tweet::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

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
    async fn test_find_by_owner() {
        let t1 = create_test_tweet("t1", "u1");
        let t2 = create_test_tweet("t2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[t1, t2]])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let result = repo.find_by_owner("u1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tweet::Model>::new()])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
