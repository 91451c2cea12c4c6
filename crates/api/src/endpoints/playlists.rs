//! Playlist endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use playtube_common::AppResult;
use playtube_core::{CreatePlaylistInput, PlaylistDetail, UpdatePlaylistInput};
use playtube_db::{entities::playlist, repositories::playlist::decode_video_ids};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::videos::VideoResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Playlist response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub video_ids: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<playlist::Model> for PlaylistResponse {
    fn from(playlist: playlist::Model) -> Self {
        let video_ids = decode_video_ids(&playlist.video_ids);
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            owner_id: playlist.owner_id,
            video_ids,
            created_at: playlist.created_at.to_rfc3339(),
            updated_at: playlist.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Playlist with resolved videos.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    pub videos: Vec<VideoResponse>,
}

impl From<PlaylistDetail> for PlaylistDetailResponse {
    fn from(detail: PlaylistDetail) -> Self {
        Self {
            playlist: detail.playlist.into(),
            videos: detail.videos.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create playlist request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Create a playlist.
async fn create_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let playlist = state
        .playlist_service
        .create(
            &user.id,
            CreatePlaylistInput {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(ApiResponse::created(
        playlist.into(),
        "Playlist created successfully",
    ))
}

/// Playlists owned by a user.
async fn user_playlists(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PlaylistResponse>>> {
    let playlists = state.playlist_service.list_for_user(&user_id).await?;

    Ok(ApiResponse::ok(
        playlists.into_iter().map(Into::into).collect(),
        "Playlists fetched successfully",
    ))
}

/// A playlist with its videos resolved.
async fn get_playlist(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<PlaylistDetailResponse>> {
    let detail = state.playlist_service.get(&playlist_id).await?;

    Ok(ApiResponse::ok(
        detail.into(),
        "Playlist fetched successfully",
    ))
}

/// Update playlist request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update a playlist's name/description.
async fn update_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let playlist = state
        .playlist_service
        .update(
            &playlist_id,
            &user.id,
            UpdatePlaylistInput {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(ApiResponse::ok(
        playlist.into(),
        "Playlist updated successfully",
    ))
}

/// Delete a playlist.
async fn delete_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state
        .playlist_service
        .delete(&playlist_id, &user.id)
        .await?;

    Ok(ApiResponse::ok((), "Playlist deleted successfully"))
}

/// Add a video to a playlist.
async fn add_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let playlist = state
        .playlist_service
        .add_video(&playlist_id, &video_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(
        playlist.into(),
        "Video added to playlist successfully",
    ))
}

/// Remove a video from a playlist.
async fn remove_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let playlist = state
        .playlist_service
        .remove_video(&playlist_id, &video_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(
        playlist.into(),
        "Video removed from playlist successfully",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(user_playlists))
        .route(
            "/{playlistId}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/{videoId}/{playlistId}", patch(add_video))
        .route("/remove/{videoId}/{playlistId}", patch(remove_video))
}
