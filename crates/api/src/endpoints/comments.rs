//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use playtube_common::AppResult;
use playtube_db::entities::comment;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub video_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            video_id: comment.video_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.map(|t| t.to_rfc3339()),
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

/// List comments on a video, newest first.
async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state
        .comment_service
        .list_for_video(&video_id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(Into::into).collect(),
        "Comments fetched successfully",
    ))
}

/// Comment content body.
#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// Add a comment to a video.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .add(&video_id, &user.id, &body.content)
        .await?;

    Ok(ApiResponse::created(
        comment.into(),
        "Comment created successfully",
    ))
}

/// Update a comment.
async fn update_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .update(&comment_id, &user.id, &body.content)
        .await?;

    Ok(ApiResponse::ok(
        comment.into(),
        "Comment updated successfully",
    ))
}

/// Delete a comment.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&comment_id, &user.id).await?;
    Ok(ApiResponse::ok((), "Comment deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{videoId}", get(list_comments).post(add_comment))
        .route(
            "/c/{commentId}",
            patch(update_comment).delete(delete_comment),
        )
}
