//! API middleware.

#![allow(missing_docs)]

use std::path::PathBuf;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use playtube_common::TokenManager;
use playtube_core::{
    ChannelService, CommentService, LikeService, PlaylistService, SubscriptionService,
    TweetService, UserService, VideoService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub channel_service: ChannelService,
    pub video_service: VideoService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub subscription_service: SubscriptionService,
    pub playlist_service: PlaylistService,
    pub tweet_service: TweetService,
    pub tokens: TokenManager,
    /// Directory where multipart bodies are staged before upload.
    pub temp_dir: PathBuf,
}

/// Authentication middleware.
///
/// Resolves the access token from the `accessToken` cookie, falling back
/// to an `Authorization: Bearer` header for clients without cookie
/// storage. A valid token puts the user model into request extensions;
/// anything else leaves the request anonymous and lets the extractors
/// decide whether that is an error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        if let Ok(claims) = state.tokens.verify_access(&token) {
            if let Ok(user) = state.user_service.get(&claims.sub).await {
                req.extensions_mut().insert(user);
            }
        }
    }

    next.run(req).await
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get("accessToken") {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}
