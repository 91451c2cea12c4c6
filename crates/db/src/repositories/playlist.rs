//! Playlist repository.

use std::sync::Arc;

use crate::entities::{Playlist, playlist};
use playtube_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};

/// Playlist repository for database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Arc<DatabaseConnection>,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a playlist by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<playlist::Model>> {
        Playlist::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a playlist by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<playlist::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {id} not found")))
    }

    /// Find a playlist by owner and name (uniqueness pre-check).
    pub async fn find_by_owner_and_name(
        &self,
        owner_id: &str,
        name: &str,
    ) -> AppResult<Option<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::OwnerId.eq(owner_id))
            .filter(playlist::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Playlists owned by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::OwnerId.eq(owner_id))
            .order_by_desc(playlist::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a playlist.
    ///
    /// A unique-index violation on `(owner_id, name)` surfaces as `Conflict`.
    pub async fn create(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Playlist name already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a playlist.
    pub async fn update(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Playlist name already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a playlist.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let res = Playlist::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Remove a video ID from every playlist (single UPDATE).
    pub async fn scrub_video(&self, video_id: &str) -> AppResult<()> {
        Playlist::update_many()
            .col_expr(
                playlist::Column::VideoIds,
                Expr::cust_with_values("video_ids - ?", [video_id]),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Decode the JSON video-ids column into an ordered ID list.
#[must_use]
pub fn decode_video_ids(value: &serde_json::Value) -> Vec<String> {
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

    fn create_test_playlist(id: &str, owner_id: &str, name: &str) -> playlist::Model {
        playlist::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: "Favorites".to_string(),
            owner_id: owner_id.to_string(),
            video_ids: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist::Model>::new()])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_id_reports_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(!repo.delete_by_id("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_owner() {
        let p1 = create_test_playlist("p1", "u1", "Favorites");
        let p2 = create_test_playlist("p2", "u1", "Watch Later");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let result = repo.find_by_owner("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_decode_video_ids() {
        assert_eq!(
            decode_video_ids(&serde_json::json!(["v1", "v2"])),
            vec!["v1", "v2"]
        );
        assert!(decode_video_ids(&serde_json::json!(null)).is_empty());
    }
}
