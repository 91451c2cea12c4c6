//! Video repository.

use std::sync::Arc;

use crate::entities::{Video, video};
use playtube_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a video by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<video::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))
    }

    /// Find videos by IDs (order unspecified; callers re-order).
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Video::find()
            .filter(video::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a video.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a video.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let res = Video::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Increment the view counter atomically (single UPDATE query, no fetch).
    ///
    /// Returns false when the video no longer exists.
    pub async fn increment_view_count(&self, id: &str) -> AppResult<bool> {
        let res = Video::update_many()
            .col_expr(
                video::Column::ViewCount,
                Expr::col(video::Column::ViewCount).add(1),
            )
            .filter(video::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// List videos, newest first.
    ///
    /// Optional owner filter, published-only filter, and case-insensitive
    /// title search.
    pub async fn find_page(
        &self,
        owner_id: Option<&str>,
        published_only: bool,
        title_query: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<video::Model>> {
        let mut query = Video::find().order_by_desc(video::Column::CreatedAt);

        if let Some(owner_id) = owner_id {
            query = query.filter(video::Column::OwnerId.eq(owner_id));
        }
        if published_only {
            query = query.filter(video::Column::IsPublished.eq(true));
        }
        if let Some(title_query) = title_query {
            let escaped = title_query.replace('%', "\\%").replace('_', "\\_");
            query = query.filter(video::Column::Title.contains(&escaped));
        }

        query
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

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            title: "Test Video".to_string(),
            description: "A test video".to_string(),
            video_url: "https://media.example.com/v.mp4".to_string(),
            thumbnail_url: "https://media.example.com/t.png".to_string(),
            duration_seconds: 42.5,
            view_count: 0,
            is_published: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let video = create_test_video("v1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video.clone()]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo.get_by_id("v1").await.unwrap();

        assert_eq!(result.id, "v1");
        assert_eq!(result.owner_id, "u1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::VideoNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("Expected VideoNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_increment_view_count_hits_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert!(repo.increment_view_count("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_view_count_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert!(!repo.increment_view_count("gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_page() {
        let v1 = create_test_video("v1", "u1");
        let v2 = create_test_video("v2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo
            .find_page(Some("u1"), true, None, 10, 0)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }
}
