//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Case-folded copy of `username` used for lookups
    #[sea_orm(unique)]
    pub username_lower: String,

    /// Stored case-folded
    #[sea_orm(unique)]
    pub email: String,

    pub full_name: String,

    /// Argon2 hash, never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Avatar URL on the media host
    pub avatar_url: String,

    /// Cover image URL on the media host
    #[sea_orm(nullable)]
    pub cover_image_url: Option<String>,

    /// Currently valid refresh token, cleared on logout
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    /// Ordered array of watched video IDs, most recent last
    #[sea_orm(column_type = "JsonBinary")]
    pub watch_history: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video::Entity")]
    Videos,

    #[sea_orm(has_many = "super::playlist::Entity")]
    Playlists,

    #[sea_orm(has_many = "super::tweet::Entity")]
    Tweets,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Videos.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Playlists.def()
    }
}

impl Related<super::tweet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tweets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
