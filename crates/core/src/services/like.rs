//! Like service.
//!
//! Likes are toggles: create-if-absent, delete-if-present. The store's
//! unique indexes make racing toggles converge; an insert conflict is
//! read as "already liked" rather than an error.

use playtube_common::{AppError, AppResult, IdGenerator, is_valid_id};
use playtube_db::{
    entities::like,
    repositories::{
        CommentRepository, LikeRepository, TweetRepository, UserRepository, VideoRepository,
    },
};
use sea_orm::Set;

use crate::services::video::OwnerProfile;

/// A liked-videos entry: the video plus its owner's trimmed profile.
#[derive(Debug, Clone)]
pub struct LikedVideo {
    pub video: playtube_db::entities::video::Model,
    pub owner: Option<OwnerProfile>,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    video_repo: VideoRepository,
    comment_repo: CommentRepository,
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(
        like_repo: LikeRepository,
        video_repo: VideoRepository,
        comment_repo: CommentRepository,
        tweet_repo: TweetRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            like_repo,
            video_repo,
            comment_repo,
            tweet_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a like on a video. Returns the resulting liked state.
    pub async fn toggle_video(&self, user_id: &str, video_id: &str) -> AppResult<bool> {
        if !is_valid_id(video_id) {
            return Err(AppError::BadRequest("Invalid video ID".to_string()));
        }
        self.video_repo.get_by_id(video_id).await?;

        if self.like_repo.delete_for_video(video_id, user_id).await? {
            return Ok(false);
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(Some(video_id.to_string())),
            comment_id: Set(None),
            tweet_id: Set(None),
            liked_by: Set(user_id.to_string()),
            ..Default::default()
        };

        match self.like_repo.create(model).await {
            Ok(_) => Ok(true),
            // A concurrent toggle won the insert; converge on "liked".
            Err(AppError::Conflict(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Toggle a like on a comment. Returns the resulting liked state.
    pub async fn toggle_comment(&self, user_id: &str, comment_id: &str) -> AppResult<bool> {
        if !is_valid_id(comment_id) {
            return Err(AppError::BadRequest("Invalid comment ID".to_string()));
        }
        self.comment_repo.get_by_id(comment_id).await?;

        if self.like_repo.delete_for_comment(comment_id, user_id).await? {
            return Ok(false);
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(None),
            comment_id: Set(Some(comment_id.to_string())),
            tweet_id: Set(None),
            liked_by: Set(user_id.to_string()),
            ..Default::default()
        };

        match self.like_repo.create(model).await {
            Ok(_) | Err(AppError::Conflict(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Toggle a like on a tweet. Returns the resulting liked state.
    pub async fn toggle_tweet(&self, user_id: &str, tweet_id: &str) -> AppResult<bool> {
        if !is_valid_id(tweet_id) {
            return Err(AppError::BadRequest("Invalid tweet ID".to_string()));
        }
        self.tweet_repo.get_by_id(tweet_id).await?;

        if self.like_repo.delete_for_tweet(tweet_id, user_id).await? {
            return Ok(false);
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(None),
            comment_id: Set(None),
            tweet_id: Set(Some(tweet_id.to_string())),
            liked_by: Set(user_id.to_string()),
            ..Default::default()
        };

        match self.like_repo.create(model).await {
            Ok(_) | Err(AppError::Conflict(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Videos the user has liked, newest like first.
    ///
    /// Likes whose video has since been deleted are skipped.
    pub async fn liked_videos(
        &self,
        user_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<LikedVideo>> {
        let limit = limit.clamp(1, 100);
        let offset = page.saturating_sub(1) * limit;

        let likes = self
            .like_repo
            .find_video_likes_by_user(user_id, limit, offset)
            .await?;

        let video_ids: Vec<String> = likes.iter().filter_map(|l| l.video_id.clone()).collect();
        let videos = self.video_repo.find_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;

        let mut entries = Vec::with_capacity(video_ids.len());
        for id in &video_ids {
            if let Some(video) = videos.iter().find(|v| &v.id == id) {
                let owner = owners
                    .iter()
                    .find(|u| u.id == video.owner_id)
                    .map(|u| OwnerProfile::from(u.clone()));
                entries.push(LikedVideo {
                    video: video.clone(),
                    owner,
                });
            }
        }

        Ok(entries)
    }
}
