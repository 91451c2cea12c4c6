//! Video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Publishing channel (owner) user ID
    #[sea_orm(indexed)]
    pub owner_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Video file URL on the media host
    pub video_url: String,

    /// Thumbnail URL on the media host
    pub thumbnail_url: String,

    /// Duration reported by the media host
    pub duration_seconds: f64,

    /// Monotonically non-decreasing
    #[sea_orm(default_value = 0)]
    pub view_count: i64,

    #[sea_orm(default_value = true)]
    pub is_published: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
