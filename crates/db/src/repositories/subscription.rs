//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use playtube_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by channel and subscriber.
    pub async fn find_by_pair(
        &self,
        channel_id: &str,
        subscriber_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is subscribed to a channel.
    pub async fn is_subscribed(&self, channel_id: &str, subscriber_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(channel_id, subscriber_id).await?.is_some())
    }

    /// Create a subscription.
    ///
    /// A unique-index violation on `(channel_id, subscriber_id)` surfaces
    /// as `Conflict`, which toggle callers treat as "already subscribed".
    pub async fn create(&self, model: subscription::ActiveModel) -> AppResult<subscription::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Already subscribed".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a subscription by pair. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, channel_id: &str, subscriber_id: &str) -> AppResult<bool> {
        let res = Subscription::delete_many()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Count subscribers of a channel.
    pub async fn count_subscribers(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count channels a user is subscribed to.
    pub async fn count_subscribed_to(&self, subscriber_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscribers of a channel (paginated).
    pub async fn find_subscribers(
        &self,
        channel_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Channels a user is subscribed to (paginated).
    pub async fn find_subscriptions(
        &self,
        subscriber_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
