//! Repositories for database operations.

#![allow(missing_docs)]

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::CommentRepository;
pub use like::LikeRepository;
pub use playlist::PlaylistRepository;
pub use subscription::SubscriptionRepository;
pub use tweet::TweetRepository;
pub use user::UserRepository;
pub use video::VideoRepository;
