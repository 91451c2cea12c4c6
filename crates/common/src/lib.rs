//! Common utilities and shared types for playtube-rs.
//!
//! This crate provides foundational components used across all playtube-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Session tokens**: JWT access/refresh token issuing via [`TokenManager`]
//! - **Media host**: Client for the external media-hosting service
//!
//! # Example
//!
//! ```no_run
//! use playtube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod media;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, is_valid_id};
pub use media::{HostedMedia, MediaHost, RemoteMediaHost, TempMedia};
pub use token::{AccessClaims, RefreshClaims, SessionTokens, TokenManager};
