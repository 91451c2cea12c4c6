//! Like entity.
//!
//! A like targets exactly one of a video, a comment, or a tweet. The
//! one-of shape is enforced by a table CHECK constraint and re-checked in
//! the service layer before insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(nullable, indexed)]
    pub video_id: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub comment_id: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub tweet_id: Option<String>,

    #[sea_orm(indexed)]
    pub liked_by: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id",
        on_delete = "Cascade"
    )]
    Video,

    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id",
        on_delete = "Cascade"
    )]
    Comment,

    #[sea_orm(
        belongs_to = "super::tweet::Entity",
        from = "Column::TweetId",
        to = "super::tweet::Column::Id",
        on_delete = "Cascade"
    )]
    Tweet,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LikedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    LikedBy,
}

impl ActiveModelBehavior for ActiveModel {}
