//! Like endpoints: toggles and the liked-videos listing.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use playtube_common::AppResult;
use playtube_core::LikedVideo;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::videos::{OwnerProfileResponse, VideoResponse},
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Toggle result response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub liked: bool,
}

/// Toggle a like on a video.
async fn toggle_video_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<ToggleLikeResponse>> {
    let liked = state.like_service.toggle_video(&user.id, &video_id).await?;

    let message = if liked {
        "Video liked successfully"
    } else {
        "Video unliked successfully"
    };
    Ok(ApiResponse::ok(ToggleLikeResponse { liked }, message))
}

/// Toggle a like on a comment.
async fn toggle_comment_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<ToggleLikeResponse>> {
    let liked = state
        .like_service
        .toggle_comment(&user.id, &comment_id)
        .await?;

    let message = if liked {
        "Comment liked successfully"
    } else {
        "Comment unliked successfully"
    };
    Ok(ApiResponse::ok(ToggleLikeResponse { liked }, message))
}

/// Toggle a like on a tweet.
async fn toggle_tweet_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<ToggleLikeResponse>> {
    let liked = state.like_service.toggle_tweet(&user.id, &tweet_id).await?;

    let message = if liked {
        "Tweet liked successfully"
    } else {
        "Tweet unliked successfully"
    };
    Ok(ApiResponse::ok(ToggleLikeResponse { liked }, message))
}

/// Liked-videos entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoResponse {
    pub video: VideoResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerProfileResponse>,
}

impl From<LikedVideo> for LikedVideoResponse {
    fn from(entry: LikedVideo) -> Self {
        Self {
            video: entry.video.into(),
            owner: entry.owner.map(Into::into),
        }
    }
}

/// Pagination parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// Videos the user has liked.
async fn liked_videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<LikedVideoResponse>>> {
    let entries = state
        .like_service
        .liked_videos(&user.id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        entries.into_iter().map(Into::into).collect(),
        "Liked videos fetched successfully",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video_like))
        .route("/toggle/c/{commentId}", post(toggle_comment_like))
        .route("/toggle/t/{tweetId}", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}
