//! Business logic services.

#![allow(missing_docs)]

pub mod channel;
pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use channel::{ChannelProfile, ChannelService};
pub use comment::CommentService;
pub use like::{LikeService, LikedVideo};
pub use playlist::{CreatePlaylistInput, PlaylistDetail, PlaylistService, UpdatePlaylistInput};
pub use subscription::{ChannelCard, SubscriptionService};
pub use tweet::TweetService;
pub use user::{
    LoginInput, RegisterInput, UpdateAccountInput, UserService, WatchedVideo,
};
pub use video::{
    ListVideosQuery, OwnerProfile, PublishVideoInput, UpdateVideoInput, VideoDetail, VideoService,
};
