//! Subscription endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use playtube_common::AppResult;
use playtube_core::ChannelCard;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Toggle result response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubscriptionResponse {
    pub subscribed: bool,
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

/// Toggle a subscription to a channel.
async fn toggle_subscription(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<ToggleSubscriptionResponse>> {
    let subscribed = state
        .subscription_service
        .toggle(&user.id, &channel_id)
        .await?;

    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(
        ToggleSubscriptionResponse { subscribed },
        message,
    ))
}

/// Subscribers of a channel.
async fn channel_subscribers(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<ChannelCard>>> {
    let subscribers = state
        .subscription_service
        .subscribers(&channel_id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

/// Channels a user is subscribed to.
async fn subscribed_channels(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<ChannelCard>>> {
    let channels = state
        .subscription_service
        .subscribed_channels(&subscriber_id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/c/{channelId}",
            post(toggle_subscription).get(channel_subscribers),
        )
        .route("/u/{subscriberId}", get(subscribed_channels))
}
