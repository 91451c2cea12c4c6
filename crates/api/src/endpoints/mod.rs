//! API endpoints.

mod comments;
mod healthcheck;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use axum::Router;

use crate::middleware::AppState;

/// Create the `/api/v1` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/playlists", playlists::router())
        .nest("/tweets", tweets::router())
        .nest("/healthcheck", healthcheck::router())
}
