//! PlayTube server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use playtube_api::{middleware::AppState, router as api_router};
use playtube_common::{Config, MediaHost, RemoteMediaHost, TokenManager};
use playtube_core::{
    ChannelService, CommentService, LikeService, PlaylistService, SubscriptionService,
    TweetService, UserService, VideoService,
};
use playtube_db::repositories::{
    CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository,
    TweetRepository, UserRepository, VideoRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Uploads cap (the video file dominates).
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playtube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting playtube server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = playtube_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    playtube_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let playlist_repo = PlaylistRepository::new(Arc::clone(&db));
    let tweet_repo = TweetRepository::new(Arc::clone(&db));

    // Session tokens and media host
    let tokens = TokenManager::new(&config.auth);
    let media_host: Arc<dyn MediaHost> = Arc::new(RemoteMediaHost::new(&config.media)?);
    info!("Media host client ready");

    // Initialize services
    let user_service = UserService::new(
        user_repo.clone(),
        video_repo.clone(),
        media_host.clone(),
        tokens.clone(),
    );
    let channel_service = ChannelService::new(user_repo.clone(), subscription_repo.clone());
    let video_service = VideoService::new(
        video_repo.clone(),
        user_repo.clone(),
        like_repo.clone(),
        comment_repo.clone(),
        subscription_repo.clone(),
        playlist_repo.clone(),
        media_host.clone(),
    );
    let comment_service = CommentService::new(comment_repo.clone(), video_repo.clone());
    let like_service = LikeService::new(
        like_repo,
        video_repo.clone(),
        comment_repo,
        tweet_repo.clone(),
        user_repo.clone(),
    );
    let subscription_service = SubscriptionService::new(subscription_repo, user_repo.clone());
    let playlist_service = PlaylistService::new(playlist_repo, video_repo);
    let tweet_service = TweetService::new(tweet_repo, user_repo);

    // Create app state
    let state = AppState {
        user_service,
        channel_service,
        video_service,
        comment_service,
        like_service,
        subscription_service,
        playlist_service,
        tweet_service,
        tokens,
        temp_dir: config.media.temp_dir.clone().into(),
    };

    // Build router
    let app = Router::new()
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            playtube_api::middleware::auth_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
