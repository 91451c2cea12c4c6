//! Create like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Like::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Like::VideoId).string_len(32))
                    .col(ColumnDef::new(Like::CommentId).string_len(32))
                    .col(ColumnDef::new(Like::TweetId).string_len(32))
                    .col(ColumnDef::new(Like::LikedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Like::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_video")
                            .from(Like::Table, Like::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_comment")
                            .from(Like::Table, Like::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_tweet")
                            .from(Like::Table, Like::TweetId)
                            .to(Tweet::Table, Tweet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_liked_by")
                            .from(Like::Table, Like::LikedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A like targets exactly one of a video, a comment, or a tweet.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE "like"
                ADD CONSTRAINT chk_like_single_target CHECK (
                    (video_id IS NOT NULL)::int
                    + (comment_id IS NOT NULL)::int
                    + (tweet_id IS NOT NULL)::int = 1
                );
                "#,
            )
            .await?;

        // Partial unique indexes: at most one like per (target, liked_by)
        // pair. Racing toggles hit the index and converge instead of
        // double-inserting.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_like_video_liked_by
                ON "like" (video_id, liked_by)
                WHERE video_id IS NOT NULL;
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_like_comment_liked_by
                ON "like" (comment_id, liked_by)
                WHERE comment_id IS NOT NULL;
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_like_tweet_liked_by
                ON "like" (tweet_id, liked_by)
                WHERE tweet_id IS NOT NULL;
                "#,
            )
            .await?;

        // Index: liked_by (for the liked-videos listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_like_liked_by")
                    .table(Like::Table)
                    .col(Like::LikedBy)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Like {
    Table,
    Id,
    VideoId,
    CommentId,
    TweetId,
    LikedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
}

#[derive(Iden)]
enum Tweet {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
