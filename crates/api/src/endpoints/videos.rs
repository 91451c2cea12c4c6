//! Video endpoints: publishing, the detail view, owner-scoped mutations,
//! listing.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, patch},
};
use playtube_common::{AppError, AppResult, TempMedia};
use playtube_core::{
    ListVideosQuery, OwnerProfile, PublishVideoInput, UpdateVideoInput, VideoDetail,
};
use playtube_db::entities::video;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    multipart::{stage_file_field, text_field},
    response::ApiResponse,
};

/// Video response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub view_count: i64,
    pub is_published: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<video::Model> for VideoResponse {
    fn from(video: video::Model) -> Self {
        Self {
            id: video.id,
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration_seconds: video.duration_seconds,
            view_count: video.view_count,
            is_published: video.is_published,
            created_at: video.created_at.to_rfc3339(),
            updated_at: video.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Trimmed owner profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfileResponse {
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<OwnerProfile> for OwnerProfileResponse {
    fn from(owner: OwnerProfile) -> Self {
        Self {
            username: owner.username,
            full_name: owner.full_name,
            avatar_url: owner.avatar_url,
            created_at: owner.created_at.to_rfc3339(),
            updated_at: owner.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Composed video detail response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailResponse {
    #[serde(flatten)]
    pub video: VideoResponse,
    pub owner: OwnerProfileResponse,
    pub total_likes: u64,
    pub total_comments: u64,
    pub owner_subscriber_count: u64,
    pub viewer_is_subscribed_to_owner: bool,
    pub viewer_has_liked: bool,
}

impl From<VideoDetail> for VideoDetailResponse {
    fn from(detail: VideoDetail) -> Self {
        Self {
            video: detail.video.into(),
            owner: detail.owner.into(),
            total_likes: detail.total_likes,
            total_comments: detail.total_comments,
            owner_subscriber_count: detail.owner_subscriber_count,
            viewer_is_subscribed_to_owner: detail.viewer_is_subscribed_to_owner,
            viewer_has_liked: detail.viewer_has_liked,
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub user_id: Option<String>,
    pub query: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// List videos, newest first.
async fn list_videos(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListVideosParams>,
) -> AppResult<ApiResponse<Vec<VideoResponse>>> {
    let videos = state
        .video_service
        .list(
            ListVideosQuery {
                page: params.page,
                limit: params.limit,
                owner_id: params.user_id,
                title_query: params.query,
            },
            viewer.as_ref().map(|u| u.id.as_str()),
        )
        .await?;

    Ok(ApiResponse::ok(
        videos.into_iter().map(Into::into).collect(),
        "Videos fetched successfully",
    ))
}

/// Publish a video (multipart: title, description, videoFile, thumbnail).
async fn publish_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<VideoResponse>> {
    let mut title = None;
    let mut description = None;
    let mut video_file: Option<TempMedia> = None;
    let mut thumbnail: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => title = Some(text_field(field).await?),
            "description" => description = Some(text_field(field).await?),
            "videoFile" => video_file = Some(stage_file_field(&state.temp_dir, field).await?),
            "thumbnail" => thumbnail = Some(stage_file_field(&state.temp_dir, field).await?),
            _ => {}
        }
    }

    let input = PublishVideoInput {
        title: title
            .ok_or_else(|| AppError::BadRequest("Title and description are required".to_string()))?,
        description: description
            .ok_or_else(|| AppError::BadRequest("Title and description are required".to_string()))?,
    };
    let video_file = video_file
        .ok_or_else(|| AppError::BadRequest("Video file is required".to_string()))?;
    let thumbnail = thumbnail
        .ok_or_else(|| AppError::BadRequest("Thumbnail file is required".to_string()))?;

    let video = state
        .video_service
        .publish(&user.id, input, &video_file, &thumbnail)
        .await?;

    Ok(ApiResponse::created(
        video.into(),
        "Video published successfully",
    ))
}

/// Composed detail view; counts one view per call.
async fn get_video(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoDetailResponse>> {
    let detail = state
        .video_service
        .detail(&video_id, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(ApiResponse::ok(
        detail.into(),
        "Video fetched successfully",
    ))
}

/// Update a video (multipart: optional title, description, thumbnail).
async fn update_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<VideoResponse>> {
    let mut title = None;
    let mut description = None;
    let mut thumbnail: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => title = Some(text_field(field).await?),
            "description" => description = Some(text_field(field).await?),
            "thumbnail" => thumbnail = Some(stage_file_field(&state.temp_dir, field).await?),
            _ => {}
        }
    }

    let video = state
        .video_service
        .update(
            &video_id,
            &user.id,
            UpdateVideoInput { title, description },
            thumbnail.as_ref(),
        )
        .await?;

    Ok(ApiResponse::ok(video.into(), "Video updated successfully"))
}

/// Delete a video.
async fn delete_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.video_service.delete(&video_id, &user.id).await?;
    Ok(ApiResponse::ok((), "Video deleted successfully"))
}

/// Flip the published flag.
async fn toggle_publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let video = state
        .video_service
        .toggle_publish(&video_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(
        video.into(),
        "Publish status updated successfully",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/{videoId}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/{videoId}", patch(toggle_publish))
}
