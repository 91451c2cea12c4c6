//! Comment service.

use playtube_common::{AppError, AppResult, IdGenerator, is_valid_id};
use playtube_db::{
    entities::comment,
    repositories::{CommentRepository, VideoRepository},
};
use sea_orm::Set;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    video_repo: VideoRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(comment_repo: CommentRepository, video_repo: VideoRepository) -> Self {
        Self {
            comment_repo,
            video_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List comments on a video, newest first.
    pub async fn list_for_video(
        &self,
        video_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<comment::Model>> {
        if !is_valid_id(video_id) {
            return Err(AppError::BadRequest("Invalid video ID".to_string()));
        }
        // Resolve the video first so a dangling ID is NotFound, not an
        // empty page.
        self.video_repo.get_by_id(video_id).await?;

        let limit = limit.clamp(1, 100);
        let offset = page.saturating_sub(1) * limit;
        self.comment_repo.find_by_video(video_id, limit, offset).await
    }

    /// Add a comment to a video.
    pub async fn add(
        &self,
        video_id: &str,
        author_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Cannot create an empty comment".to_string(),
            ));
        }
        if !is_valid_id(video_id) {
            return Err(AppError::BadRequest("Invalid video ID".to_string()));
        }

        self.video_repo.get_by_id(video_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(video_id.to_string()),
            author_id: Set(author_id.to_string()),
            content: Set(content.trim().to_string()),
            ..Default::default()
        };

        self.comment_repo.create(model).await
    }

    /// Update a comment's content. Author-scoped.
    pub async fn update(
        &self,
        comment_id: &str,
        author_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Cannot store an empty comment".to_string(),
            ));
        }

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != author_id {
            return Err(AppError::Forbidden(
                "Only the author can update a comment".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(content.trim().to_string());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.comment_repo.update(active).await
    }

    /// Delete a comment. Author-scoped.
    pub async fn delete(&self, comment_id: &str, author_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != author_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a comment".to_string(),
            ));
        }

        self.comment_repo.delete_by_id(comment_id).await?;
        Ok(())
    }
}
