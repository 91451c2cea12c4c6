//! Tweet endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use playtube_common::AppResult;
use playtube_db::entities::tweet;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Tweet response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<tweet::Model> for TweetResponse {
    fn from(tweet: tweet::Model) -> Self {
        Self {
            id: tweet.id,
            owner_id: tweet.owner_id,
            content: tweet.content,
            created_at: tweet.created_at.to_rfc3339(),
            updated_at: tweet.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Tweet content body.
#[derive(Debug, Deserialize)]
pub struct TweetBody {
    pub content: String,
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

/// Create a tweet.
async fn create_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<TweetBody>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let tweet = state.tweet_service.create(&user.id, &body.content).await?;

    Ok(ApiResponse::created(
        tweet.into(),
        "Tweet created successfully",
    ))
}

/// Tweets by a user, newest first.
async fn user_tweets(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<TweetResponse>>> {
    let tweets = state
        .tweet_service
        .list_for_user(&user_id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        tweets.into_iter().map(Into::into).collect(),
        "Tweets fetched successfully",
    ))
}

/// Update a tweet.
async fn update_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Json(body): Json<TweetBody>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let tweet = state
        .tweet_service
        .update(&tweet_id, &user.id, &body.content)
        .await?;

    Ok(ApiResponse::ok(tweet.into(), "Tweet updated successfully"))
}

/// Delete a tweet.
async fn delete_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.tweet_service.delete(&tweet_id, &user.id).await?;
    Ok(ApiResponse::ok((), "Tweet deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{userId}", get(user_tweets))
        .route("/{tweetId}", patch(update_tweet).delete(delete_tweet))
}
