//! Video service: publishing, the detail-view composer, owner-scoped
//! mutations, and listing.

use std::sync::Arc;

use playtube_common::{AppError, AppResult, IdGenerator, MediaHost, TempMedia, is_valid_id};
use playtube_db::{
    entities::{user, video},
    repositories::{
        CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository,
        UserRepository, VideoRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Trimmed owner profile merged into composed views.
#[derive(Debug, Clone)]
pub struct OwnerProfile {
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: Option<chrono::DateTime<chrono::FixedOffset>>,
}

impl From<user::Model> for OwnerProfile {
    fn from(user: user::Model) -> Self {
        Self {
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Composed video detail with derived counters and viewer flags.
#[derive(Debug, Clone)]
pub struct VideoDetail {
    pub video: video::Model,
    pub owner: OwnerProfile,
    pub total_likes: u64,
    pub total_comments: u64,
    pub owner_subscriber_count: u64,
    pub viewer_is_subscribed_to_owner: bool,
    pub viewer_has_liked: bool,
}

/// Input for publishing a video.
#[derive(Debug, Deserialize, Validate)]
pub struct PublishVideoInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,
}

/// Input for updating a video.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVideoInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub description: Option<String>,
}

/// Listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListVideosQuery {
    pub page: u64,
    pub limit: u64,
    pub owner_id: Option<String>,
    pub title_query: Option<String>,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    subscription_repo: SubscriptionRepository,
    playlist_repo: PlaylistRepository,
    media_host: Arc<dyn MediaHost>,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub fn new(
        video_repo: VideoRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        subscription_repo: SubscriptionRepository,
        playlist_repo: PlaylistRepository,
        media_host: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            video_repo,
            user_repo,
            like_repo,
            comment_repo,
            subscription_repo,
            playlist_repo,
            media_host,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a new video.
    ///
    /// Both files go to the media host; the duration comes from the
    /// host's metadata for the video file.
    pub async fn publish(
        &self,
        owner_id: &str,
        input: PublishVideoInput,
        video_file: &TempMedia,
        thumbnail: &TempMedia,
    ) -> AppResult<video::Model> {
        input.validate()?;

        let hosted_video = self.media_host.upload(video_file).await?;
        let hosted_thumbnail = self.media_host.upload(thumbnail).await?;

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            video_url: Set(hosted_video.url),
            thumbnail_url: Set(hosted_thumbnail.url),
            duration_seconds: Set(hosted_video.duration.unwrap_or(0.0)),
            view_count: Set(0),
            is_published: Set(true),
            ..Default::default()
        };

        self.video_repo.create(model).await
    }

    /// Compose the detail view for a video, as seen by a viewer.
    ///
    /// Every successful call counts one view. The four relation lookups
    /// are independent once the video resolves and run concurrently. The
    /// watch-history append is a detached best-effort task: it is skipped
    /// for anonymous viewers and its failure never surfaces to the read.
    pub async fn detail(&self, video_id: &str, viewer_id: Option<&str>) -> AppResult<VideoDetail> {
        if !is_valid_id(video_id) {
            return Err(AppError::VideoNotFound(video_id.to_string()));
        }

        let mut video = self.video_repo.get_by_id(video_id).await?;

        // Atomic SQL increment; the fetched model is bumped to match
        // rather than refetched.
        if !self.video_repo.increment_view_count(video_id).await? {
            return Err(AppError::VideoNotFound(video_id.to_string()));
        }
        video.view_count += 1;

        let (total_likes, viewer_has_liked, total_comments, owner_subscriber_count, viewer_is_subscribed_to_owner, owner) = tokio::try_join!(
            self.like_repo.count_for_video(video_id),
            async {
                match viewer_id {
                    Some(viewer_id) => self.like_repo.has_liked_video(video_id, viewer_id).await,
                    None => Ok(false),
                }
            },
            self.comment_repo.count_for_video(video_id),
            self.subscription_repo.count_subscribers(&video.owner_id),
            async {
                match viewer_id {
                    Some(viewer_id) => {
                        self.subscription_repo
                            .is_subscribed(&video.owner_id, viewer_id)
                            .await
                    }
                    None => Ok(false),
                }
            },
            self.user_repo.get_by_id(&video.owner_id),
        )?;

        if let Some(viewer_id) = viewer_id {
            let user_repo = self.user_repo.clone();
            let viewer_id = viewer_id.to_string();
            let video_id = video_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = user_repo.append_watch_history(&viewer_id, &video_id).await {
                    tracing::warn!(
                        viewer_id = %viewer_id,
                        video_id = %video_id,
                        error = %e,
                        "Failed to append watch history"
                    );
                }
            });
        }

        Ok(VideoDetail {
            video,
            owner: owner.into(),
            total_likes,
            total_comments,
            owner_subscriber_count,
            viewer_is_subscribed_to_owner,
            viewer_has_liked,
        })
    }

    /// Update a video's title, description, and optionally its thumbnail.
    pub async fn update(
        &self,
        video_id: &str,
        owner_id: &str,
        input: UpdateVideoInput,
        thumbnail: Option<&TempMedia>,
    ) -> AppResult<video::Model> {
        input.validate()?;

        if input.title.is_none() && input.description.is_none() && thumbnail.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let video = self.video_repo.get_by_id(video_id).await?;
        if video.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can update a video".to_string(),
            ));
        }

        let thumbnail_url = match thumbnail {
            Some(thumbnail) => Some(self.media_host.upload(thumbnail).await?.url),
            None => None,
        };

        let mut active: video::ActiveModel = video.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(thumbnail_url) = thumbnail_url {
            active.thumbnail_url = Set(thumbnail_url);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.video_repo.update(active).await
    }

    /// Delete a video.
    ///
    /// Comments and likes go with it via the schema's cascades; playlist
    /// membership and watch-history references are scrubbed here so no
    /// orphaned IDs remain in the JSON arrays.
    pub async fn delete(&self, video_id: &str, owner_id: &str) -> AppResult<()> {
        let video = self.video_repo.get_by_id(video_id).await?;
        if video.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete a video".to_string(),
            ));
        }

        self.video_repo.delete_by_id(video_id).await?;
        self.playlist_repo.scrub_video(video_id).await?;
        self.user_repo.scrub_watch_history(video_id).await?;

        tracing::info!(video_id = %video_id, owner_id = %owner_id, "Deleted video");
        Ok(())
    }

    /// Flip the published flag.
    pub async fn toggle_publish(&self, video_id: &str, owner_id: &str) -> AppResult<video::Model> {
        let video = self.video_repo.get_by_id(video_id).await?;
        if video.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Only the owner can change publish status".to_string(),
            ));
        }

        let next = !video.is_published;
        let mut active: video::ActiveModel = video.into();
        active.is_published = Set(next);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.video_repo.update(active).await
    }

    /// List videos, newest first.
    ///
    /// Unpublished videos only show up when the viewer filters to their
    /// own channel.
    pub async fn list(
        &self,
        query: ListVideosQuery,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<video::Model>> {
        let limit = query.limit.clamp(1, 100);
        let offset = query.page.saturating_sub(1) * limit;

        let published_only = match (&query.owner_id, viewer_id) {
            (Some(owner_id), Some(viewer_id)) => owner_id != viewer_id,
            _ => true,
        };

        self.video_repo
            .find_page(
                query.owner_id.as_deref(),
                published_only,
                query.title_query.as_deref(),
                limit,
                offset,
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use playtube_common::HostedMedia;
    use playtube_db::entities::{like, subscription};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};

    struct StubMediaHost;

    #[async_trait::async_trait]
    impl MediaHost for StubMediaHost {
        async fn upload(&self, _file: &TempMedia) -> AppResult<HostedMedia> {
            Ok(HostedMedia {
                url: "https://media.example.com/file".to_string(),
                duration: Some(42.5),
            })
        }
    }

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

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            title: "Test Video".to_string(),
            description: "A test video".to_string(),
            video_url: "https://media.example.com/v.mp4".to_string(),
            thumbnail_url: "https://media.example.com/t.png".to_string(),
            duration_seconds: 42.5,
            view_count: 7,
            is_published: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn empty_mock() -> std::sync::Arc<DatabaseConnection> {
        std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    struct ServiceMocks {
        video: std::sync::Arc<DatabaseConnection>,
        user: std::sync::Arc<DatabaseConnection>,
        like: std::sync::Arc<DatabaseConnection>,
        comment: std::sync::Arc<DatabaseConnection>,
        subscription: std::sync::Arc<DatabaseConnection>,
        playlist: std::sync::Arc<DatabaseConnection>,
    }

    fn create_service(mocks: ServiceMocks) -> VideoService {
        VideoService::new(
            VideoRepository::new(mocks.video),
            UserRepository::new(mocks.user),
            LikeRepository::new(mocks.like),
            CommentRepository::new(mocks.comment),
            SubscriptionRepository::new(mocks.subscription),
            PlaylistRepository::new(mocks.playlist),
            Arc::new(StubMediaHost),
        )
    }

    #[tokio::test]
    async fn test_detail_malformed_id_is_not_found() {
        let service = create_service(ServiceMocks {
            video: empty_mock(),
            user: empty_mock(),
            like: empty_mock(),
            comment: empty_mock(),
            subscription: empty_mock(),
            playlist: empty_mock(),
        });

        let result = service.detail("not-a-ulid", None).await;
        assert!(matches!(result, Err(AppError::VideoNotFound(_))));
    }

    #[tokio::test]
    async fn test_detail_counts_view_and_composes_anonymous() {
        let video_id = playtube_common::IdGenerator::new().generate();
        let video = create_test_video(&video_id, "u1");
        let owner = create_test_user("u1", "alice");

        let video_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[owner]])
                .into_connection(),
        );
        // Anonymous viewer: only the like count runs, no membership check.
        let like_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(5)]])
                .into_connection(),
        );
        let comment_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(3)]])
                .into_connection(),
        );
        let sub_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(9)]])
                .into_connection(),
        );

        let service = create_service(ServiceMocks {
            video: video_db,
            user: user_db,
            like: like_db,
            comment: comment_db,
            subscription: sub_db,
            playlist: empty_mock(),
        });

        let detail = service.detail(&video_id, None).await.unwrap();

        // One view counted on top of the stored 7.
        assert_eq!(detail.video.view_count, 8);
        assert_eq!(detail.total_likes, 5);
        assert_eq!(detail.total_comments, 3);
        assert_eq!(detail.owner_subscriber_count, 9);
        assert!(!detail.viewer_has_liked);
        assert!(!detail.viewer_is_subscribed_to_owner);
        assert_eq!(detail.owner.username, "alice");
    }

    #[tokio::test]
    async fn test_detail_viewer_flags() {
        let video_id = playtube_common::IdGenerator::new().generate();
        let video = create_test_video(&video_id, "u1");
        let owner = create_test_user("u1", "alice");

        let like = like::Model {
            id: "l1".to_string(),
            video_id: Some(video_id.clone()),
            comment_id: None,
            tweet_id: None,
            liked_by: "u2".to_string(),
            created_at: Utc::now().into(),
        };
        let subscription = subscription::Model {
            id: "s1".to_string(),
            channel_id: "u1".to_string(),
            subscriber_id: "u2".to_string(),
            created_at: Utc::now().into(),
        };

        let video_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        // Owner fetch; the detached watch-history append may or may not
        // run before the test ends, so no result is queued for it.
        let user_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[owner]])
                .into_connection(),
        );
        let like_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(1)]])
                .append_query_results([[like]])
                .into_connection(),
        );
        let comment_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(0)]])
                .into_connection(),
        );
        let sub_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(1)]])
                .append_query_results([[subscription]])
                .into_connection(),
        );

        let service = create_service(ServiceMocks {
            video: video_db,
            user: user_db,
            like: like_db,
            comment: comment_db,
            subscription: sub_db,
            playlist: empty_mock(),
        });

        let detail = service.detail(&video_id, Some("u2")).await.unwrap();

        assert!(detail.viewer_has_liked);
        assert!(detail.viewer_is_subscribed_to_owner);
        assert_eq!(detail.total_likes, 1);
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let video_id = playtube_common::IdGenerator::new().generate();
        let video = create_test_video(&video_id, "u1");

        let video_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .into_connection(),
        );

        let service = create_service(ServiceMocks {
            video: video_db,
            user: empty_mock(),
            like: empty_mock(),
            comment: empty_mock(),
            subscription: empty_mock(),
            playlist: empty_mock(),
        });

        let result = service
            .update(
                &video_id,
                "intruder",
                UpdateVideoInput {
                    title: Some("New title".to_string()),
                    description: None,
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_defaults_to_published_only() {
        let v1 = create_test_video(&playtube_common::IdGenerator::new().generate(), "u1");

        let video_db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1]])
                .into_connection(),
        );

        let service = create_service(ServiceMocks {
            video: video_db,
            user: empty_mock(),
            like: empty_mock(),
            comment: empty_mock(),
            subscription: empty_mock(),
            playlist: empty_mock(),
        });

        let videos = service
            .list(
                ListVideosQuery {
                    page: 1,
                    limit: 10,
                    owner_id: None,
                    title_query: None,
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(videos.len(), 1);
    }
}
