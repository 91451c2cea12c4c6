//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like};
use playtube_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a like.
    ///
    /// A unique-index violation on the `(target, liked_by)` pair surfaces
    /// as `Conflict`, which toggle callers treat as "already liked" so
    /// racing toggles converge.
    pub async fn create(&self, model: like::ActiveModel) -> AppResult<like::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Already liked".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a like on a video. Returns whether a row was removed.
    pub async fn delete_for_video(&self, video_id: &str, liked_by: &str) -> AppResult<bool> {
        let res = Like::delete_many()
            .filter(like::Column::VideoId.eq(video_id))
            .filter(like::Column::LikedBy.eq(liked_by))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Delete a like on a comment. Returns whether a row was removed.
    pub async fn delete_for_comment(&self, comment_id: &str, liked_by: &str) -> AppResult<bool> {
        let res = Like::delete_many()
            .filter(like::Column::CommentId.eq(comment_id))
            .filter(like::Column::LikedBy.eq(liked_by))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Delete a like on a tweet. Returns whether a row was removed.
    pub async fn delete_for_tweet(&self, tweet_id: &str, liked_by: &str) -> AppResult<bool> {
        let res = Like::delete_many()
            .filter(like::Column::TweetId.eq(tweet_id))
            .filter(like::Column::LikedBy.eq(liked_by))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Count likes on a video.
    pub async fn count_for_video(&self, video_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a video.
    pub async fn has_liked_video(&self, video_id: &str, liked_by: &str) -> AppResult<bool> {
        let found = Like::find()
            .filter(like::Column::VideoId.eq(video_id))
            .filter(like::Column::LikedBy.eq(liked_by))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    /// Video likes by a user, newest first (for the liked-videos listing).
    pub async fn find_video_likes_by_user(
        &self,
        liked_by: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        Like::find()
            .filter(like::Column::LikedBy.eq(liked_by))
            .filter(like::Column::VideoId.is_not_null())
            .order_by_desc(like::Column::CreatedAt)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: &str, video_id: &str, liked_by: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            video_id: Some(video_id.to_string()),
            comment_id: None,
            tweet_id: None,
            liked_by: liked_by.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_delete_for_video_removed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.delete_for_video("v1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_for_video_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.delete_for_video("v1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_liked_video() {
        let like = create_test_like("l1", "v1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .append_query_results([Vec::<like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.has_liked_video("v1", "u1").await.unwrap());
        assert!(!repo.has_liked_video("v1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_video_likes_by_user() {
        let l1 = create_test_like("l1", "v1", "u1");
        let l2 = create_test_like("l2", "v2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_video_likes_by_user("u1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
