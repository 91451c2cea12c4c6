//! User endpoints: registration, sessions, account, channel profile,
//! watch history.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use playtube_common::{AppError, AppResult, TempMedia};
use playtube_core::{
    ChannelProfile, LoginInput, RegisterInput, UpdateAccountInput, WatchedVideo,
};
use playtube_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    multipart::{stage_file_field, text_field},
    response::ApiResponse,
};

use super::videos::OwnerProfileResponse;

/// User response, without credential fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Session cookie with the hardening flags both tokens carry.
fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Register a new account (multipart: profile fields + avatar, optional
/// cover image).
async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut full_name = None;
    let mut email = None;
    let mut username = None;
    let mut password = None;
    let mut avatar: Option<TempMedia> = None;
    let mut cover_image: Option<TempMedia> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "fullName" => full_name = Some(text_field(field).await?),
            "email" => email = Some(text_field(field).await?),
            "username" => username = Some(text_field(field).await?),
            "password" => password = Some(text_field(field).await?),
            "avatar" => avatar = Some(stage_file_field(&state.temp_dir, field).await?),
            "coverImage" => cover_image = Some(stage_file_field(&state.temp_dir, field).await?),
            _ => {}
        }
    }

    let missing = |field: &str| AppError::BadRequest(format!("{field} is required"));
    let input = RegisterInput {
        username: username.ok_or_else(|| missing("username"))?,
        email: email.ok_or_else(|| missing("email"))?,
        full_name: full_name.ok_or_else(|| missing("fullName"))?,
        password: password.ok_or_else(|| missing("password"))?,
    };
    let avatar = avatar.ok_or_else(|| AppError::BadRequest("Avatar file is required".to_string()))?;

    let user = state
        .user_service
        .register(input, &avatar, cover_image.as_ref())
        .await?;

    Ok(ApiResponse::created(
        user.into(),
        "User registered successfully",
    ))
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Login response. Tokens are echoed in the body for clients that cannot
/// store cookies.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issue a session: access + refresh cookies.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let (user, tokens) = state
        .user_service
        .login(LoginInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    let jar = jar
        .add(session_cookie("accessToken", tokens.access_token.clone()))
        .add(session_cookie("refreshToken", tokens.refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: user.into(),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// End the session: clear the persisted refresh token and both cookies.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    state.user_service.logout(&user.id).await?;

    let jar = jar
        .remove(removal_cookie("accessToken"))
        .remove(removal_cookie("refreshToken"));

    Ok((jar, ApiResponse::ok((), "User logged out")))
}

/// Refresh request body (fallback when the cookie is unavailable).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Rotate the session pair against the persisted refresh token.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, ApiResponse<RefreshResponse>)> {
    let presented = jar
        .get("refreshToken")
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AppError::Unauthorized)?;

    let (_, tokens) = state.user_service.refresh_session(&presented).await?;

    let jar = jar
        .add(session_cookie("accessToken", tokens.access_token.clone()))
        .add(session_cookie("refreshToken", tokens.refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::ok(
            RefreshResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Session refreshed",
        ),
    ))
}

/// Get the authenticated user.
async fn current_user(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into(), "Current user fetched successfully")
}

/// Change password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Change the account password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .user_service
        .change_password(&user.id, &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// Update account request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Update account details.
async fn update_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateAccountRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update_account(
            &user.id,
            UpdateAccountInput {
                full_name: req.full_name,
                email: req.email,
            },
        )
        .await?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Account updated successfully",
    ))
}

/// Replace the avatar (multipart `avatar` field).
async fn update_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let staged = single_file(&state, multipart, "avatar").await?;
    let updated = state.user_service.update_avatar(&user.id, &staged).await?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Avatar updated successfully",
    ))
}

/// Replace the cover image (multipart `coverImage` field).
async fn update_cover_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let staged = single_file(&state, multipart, "coverImage").await?;
    let updated = state
        .user_service
        .update_cover_image(&user.id, &staged)
        .await?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Cover image updated successfully",
    ))
}

/// Pull one named file field out of a multipart body.
async fn single_file(
    state: &AppState,
    mut multipart: Multipart,
    field_name: &str,
) -> AppResult<TempMedia> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == field_name {
            return stage_file_field(&state.temp_dir, field).await;
        }
    }

    Err(AppError::BadRequest(format!("{field_name} file is required")))
}

/// Channel profile aggregation, viewer-aware.
async fn channel_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let profile = state.channel_service.profile(&username, viewer_id).await?;

    Ok(ApiResponse::ok(
        profile,
        "Channel profile fetched successfully",
    ))
}

/// Watch-history entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideoResponse {
    pub video: super::videos::VideoResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerProfileResponse>,
}

impl From<WatchedVideo> for WatchedVideoResponse {
    fn from(entry: WatchedVideo) -> Self {
        Self {
            video: entry.video.into(),
            owner: entry.owner.map(Into::into),
        }
    }
}

/// Watch history, resolved to video records in watched order.
async fn watch_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<WatchedVideoResponse>>> {
    let entries = state.user_service.watch_history(&user.id).await?;

    Ok(ApiResponse::ok(
        entries.into_iter().map(Into::into).collect(),
        "Watch history fetched successfully",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/current-user", get(current_user))
        .route("/change-password", post(change_password))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/channel/{username}", get(channel_profile))
        .route("/history", get(watch_history))
}
