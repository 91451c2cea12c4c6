//! Playlist service.

use playtube_common::{AppError, AppResult, IdGenerator, is_valid_id};
use playtube_db::{
    entities::{playlist, video},
    repositories::{PlaylistRepository, VideoRepository, playlist::decode_video_ids},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a playlist.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 2048))]
    pub description: String,
}

/// Input for updating a playlist.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlaylistInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

/// A playlist with its video IDs resolved to records.
#[derive(Debug, Clone)]
pub struct PlaylistDetail {
    pub playlist: playlist::Model,
    pub videos: Vec<video::Model>,
}

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlist_repo: PlaylistRepository,
    video_repo: VideoRepository,
    id_gen: IdGenerator,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub fn new(playlist_repo: PlaylistRepository, video_repo: VideoRepository) -> Self {
        Self {
            playlist_repo,
            video_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a playlist. Names are unique per owner.
    pub async fn create(
        &self,
        owner_id: &str,
        input: CreatePlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;

        if self
            .playlist_repo
            .find_by_owner_and_name(owner_id, &input.name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Playlist name already in use".to_string(),
            ));
        }

        let model = playlist::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            description: Set(input.description),
            owner_id: Set(owner_id.to_string()),
            video_ids: Set(serde_json::json!([])),
            ..Default::default()
        };

        self.playlist_repo.create(model).await
    }

    /// Playlists owned by a user.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<playlist::Model>> {
        self.playlist_repo.find_by_owner(user_id).await
    }

    /// A playlist with its videos resolved, in stored order.
    ///
    /// Videos deleted since they were added are silently skipped.
    pub async fn get(&self, playlist_id: &str) -> AppResult<PlaylistDetail> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        let ids = decode_video_ids(&playlist.video_ids);
        let videos = self.video_repo.find_by_ids(&ids).await?;

        let ordered = ids
            .iter()
            .filter_map(|id| videos.iter().find(|v| &v.id == id).cloned())
            .collect();

        Ok(PlaylistDetail {
            playlist,
            videos: ordered,
        })
    }

    /// Update a playlist's name/description. Owner-scoped.
    pub async fn update(
        &self,
        playlist_id: &str,
        owner_id: &str,
        input: UpdatePlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;

        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        if playlist.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can update a playlist".to_string(),
            ));
        }

        let mut active: playlist::ActiveModel = playlist.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.playlist_repo.update(active).await
    }

    /// Delete a playlist. Owner-scoped; absent IDs are `NotFound`.
    pub async fn delete(&self, playlist_id: &str, owner_id: &str) -> AppResult<()> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        if playlist.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete a playlist".to_string(),
            ));
        }

        self.playlist_repo.delete_by_id(playlist_id).await?;
        Ok(())
    }

    /// Add a video to a playlist. Owner-scoped; duplicates rejected.
    pub async fn add_video(
        &self,
        playlist_id: &str,
        video_id: &str,
        owner_id: &str,
    ) -> AppResult<playlist::Model> {
        if !is_valid_id(video_id) {
            return Err(AppError::BadRequest("Invalid video ID".to_string()));
        }

        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        if playlist.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify a playlist".to_string(),
            ));
        }

        // Dangling video references never enter the array.
        self.video_repo.get_by_id(video_id).await?;

        let mut ids = decode_video_ids(&playlist.video_ids);
        if ids.iter().any(|id| id == video_id) {
            return Err(AppError::Conflict(
                "Video already in playlist".to_string(),
            ));
        }
        ids.push(video_id.to_string());

        let mut active: playlist::ActiveModel = playlist.into();
        active.video_ids = Set(serde_json::json!(ids));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.playlist_repo.update(active).await
    }

    /// Remove a video from a playlist. Owner-scoped; absent videos are
    /// `NotFound`.
    pub async fn remove_video(
        &self,
        playlist_id: &str,
        video_id: &str,
        owner_id: &str,
    ) -> AppResult<playlist::Model> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;
        if playlist.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify a playlist".to_string(),
            ));
        }

        let mut ids = decode_video_ids(&playlist.video_ids);
        let before = ids.len();
        ids.retain(|id| id != video_id);
        if ids.len() == before {
            return Err(AppError::NotFound(
                "Video not in playlist".to_string(),
            ));
        }

        let mut active: playlist::ActiveModel = playlist.into();
        active.video_ids = Set(serde_json::json!(ids));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.playlist_repo.update(active).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

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

    fn create_service(
        playlist_db: Arc<DatabaseConnection>,
        video_db: Arc<DatabaseConnection>,
    ) -> PlaylistService {
        PlaylistService::new(
            PlaylistRepository::new(playlist_db),
            VideoRepository::new(video_db),
        )
    }

    #[tokio::test]
    async fn test_create_duplicate_name_is_conflict() {
        let existing = create_test_playlist("p1", "u1", "Favorites");

        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = create_service(
            playlist_db,
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
        );

        let result = service
            .create(
                "u1",
                CreatePlaylistInput {
                    name: "Favorites".to_string(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_playlist_is_not_found() {
        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist::Model>::new()])
                .into_connection(),
        );

        let service = create_service(
            playlist_db,
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
        );

        let result = service.delete("missing", "u1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_video_rejects_duplicate() {
        let video_id = IdGenerator::new().generate();
        let mut playlist = create_test_playlist("p1", "u1", "Favorites");
        playlist.video_ids = serde_json::json!([video_id.clone()]);
        let video = create_test_video(&video_id, "u1");

        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .into_connection(),
        );
        let video_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .into_connection(),
        );

        let service = create_service(playlist_db, video_db);
        let result = service.add_video("p1", &video_id, "u1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_remove_absent_video_is_not_found() {
        let playlist = create_test_playlist("p1", "u1", "Favorites");

        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .into_connection(),
        );

        let service = create_service(
            playlist_db,
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
        );

        let result = service.remove_video("p1", "v-missing", "u1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_resolves_videos_in_order() {
        let v1 = IdGenerator::new().generate();
        let v2 = IdGenerator::new().generate();
        let mut playlist = create_test_playlist("p1", "u1", "Favorites");
        playlist.video_ids = serde_json::json!([v2.clone(), v1.clone()]);

        let video_a = create_test_video(&v1, "u1");
        let video_b = create_test_video(&v2, "u1");

        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .into_connection(),
        );
        let video_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video_a, video_b]])
                .into_connection(),
        );

        let service = create_service(playlist_db, video_db);
        let detail = service.get("p1").await.unwrap();

        // Stored order wins over fetch order.
        assert_eq!(detail.videos.len(), 2);
        assert_eq!(detail.videos[0].id, v2);
        assert_eq!(detail.videos[1].id, v1);
    }

    #[tokio::test]
    async fn test_add_video_appends() {
        let video_id = IdGenerator::new().generate();
        let playlist = create_test_playlist("p1", "u1", "Favorites");
        let video = create_test_video(&video_id, "u1");

        let mut updated = create_test_playlist("p1", "u1", "Favorites");
        updated.video_ids = serde_json::json!([video_id.clone()]);

        let playlist_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[updated]])
                .into_connection(),
        );
        let video_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .into_connection(),
        );

        let service = create_service(playlist_db, video_db);
        let result = service.add_video("p1", &video_id, "u1").await.unwrap();

        assert_eq!(decode_video_ids(&result.video_ids), vec![video_id]);
    }
}
