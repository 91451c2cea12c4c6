//! HTTP API layer for playtube-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: the `/api/v1` surface (users, videos, comments,
//!   likes, subscriptions, playlists, tweets, healthcheck)
//! - **Extractors**: authentication (required and optional)
//! - **Middleware**: session-token resolution into request extensions
//! - **Response**: the uniform response envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod response;

pub use endpoints::router;
