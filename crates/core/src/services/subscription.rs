//! Subscription service.
//!
//! Subscriptions share the toggle semantics of likes: delete-if-present,
//! create-if-absent, with insert conflicts read as "already subscribed".

use playtube_common::{AppError, AppResult, IdGenerator, is_valid_id};
use playtube_db::{
    entities::{subscription, user},
    repositories::{SubscriptionRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// A user rendered as a channel/subscriber card in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<user::Model> for ChannelCard {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
        }
    }
}

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(subscription_repo: SubscriptionRepository, user_repo: UserRepository) -> Self {
        Self {
            subscription_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a subscription to a channel. Returns the resulting state.
    pub async fn toggle(&self, subscriber_id: &str, channel_id: &str) -> AppResult<bool> {
        if !is_valid_id(channel_id) {
            return Err(AppError::BadRequest("Invalid channel ID".to_string()));
        }
        if subscriber_id == channel_id {
            return Err(AppError::BadRequest(
                "Cannot subscribe to your own channel".to_string(),
            ));
        }

        self.user_repo.get_by_id(channel_id).await?;

        if self
            .subscription_repo
            .delete_by_pair(channel_id, subscriber_id)
            .await?
        {
            return Ok(false);
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            channel_id: Set(channel_id.to_string()),
            subscriber_id: Set(subscriber_id.to_string()),
            ..Default::default()
        };

        match self.subscription_repo.create(model).await {
            Ok(_) => Ok(true),
            // A concurrent toggle won the insert; converge on "subscribed".
            Err(AppError::Conflict(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Subscribers of a channel, as user cards.
    pub async fn subscribers(
        &self,
        channel_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<ChannelCard>> {
        if !is_valid_id(channel_id) {
            return Err(AppError::BadRequest("Invalid channel ID".to_string()));
        }
        self.user_repo.get_by_id(channel_id).await?;

        let limit = limit.clamp(1, 100);
        let offset = page.saturating_sub(1) * limit;

        let subscriptions = self
            .subscription_repo
            .find_subscribers(channel_id, limit, offset)
            .await?;

        let ids: Vec<String> = subscriptions.iter().map(|s| s.subscriber_id.clone()).collect();
        self.resolve_cards(&subscriptions, &ids, |s| &s.subscriber_id)
            .await
    }

    /// Channels a user is subscribed to, as channel cards.
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<ChannelCard>> {
        if !is_valid_id(subscriber_id) {
            return Err(AppError::BadRequest("Invalid subscriber ID".to_string()));
        }
        self.user_repo.get_by_id(subscriber_id).await?;

        let limit = limit.clamp(1, 100);
        let offset = page.saturating_sub(1) * limit;

        let subscriptions = self
            .subscription_repo
            .find_subscriptions(subscriber_id, limit, offset)
            .await?;

        let ids: Vec<String> = subscriptions.iter().map(|s| s.channel_id.clone()).collect();
        self.resolve_cards(&subscriptions, &ids, |s| &s.channel_id).await
    }

    /// Resolve one side of the subscription rows to user cards,
    /// preserving the listing order.
    async fn resolve_cards(
        &self,
        subscriptions: &[subscription::Model],
        ids: &[String],
        side: impl Fn(&subscription::Model) -> &String,
    ) -> AppResult<Vec<ChannelCard>> {
        let users = self.user_repo.find_by_ids(ids).await?;

        Ok(subscriptions
            .iter()
            .filter_map(|s| {
                users
                    .iter()
                    .find(|u| &u.id == side(s))
                    .map(|u| ChannelCard::from(u.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            full_name: "Test User".to_string(),
            password_hash: "$argon2id$test".to_string(),
            avatar_url: "https://media.example.com/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            watch_history: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_subscription(id: &str, channel_id: &str, subscriber_id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_service(
        sub_db: Arc<DatabaseConnection>,
        user_db: Arc<DatabaseConnection>,
    ) -> SubscriptionService {
        SubscriptionService::new(
            SubscriptionRepository::new(sub_db),
            UserRepository::new(user_db),
        )
    }

    #[tokio::test]
    async fn test_toggle_own_channel_rejected() {
        let id = IdGenerator::new().generate();

        let service = create_service(
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
        );

        let result = service.toggle(&id, &id).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_toggle_subscribes_when_absent() {
        let channel_id = IdGenerator::new().generate();
        let channel = create_test_user(&channel_id, "alice");
        let created = create_test_subscription("s1", &channel_id, "u2");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[channel]])
                .into_connection(),
        );
        let sub_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = create_service(sub_db, user_db);
        let subscribed = service.toggle("u2", &channel_id).await.unwrap();

        assert!(subscribed);
    }

    #[tokio::test]
    async fn test_toggle_unsubscribes_when_present() {
        let channel_id = IdGenerator::new().generate();
        let channel = create_test_user(&channel_id, "alice");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[channel]])
                .into_connection(),
        );
        let sub_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_service(sub_db, user_db);
        let subscribed = service.toggle("u2", &channel_id).await.unwrap();

        assert!(!subscribed);
    }

    #[tokio::test]
    async fn test_subscribers_resolved_to_cards() {
        let channel_id = IdGenerator::new().generate();
        let channel = create_test_user(&channel_id, "alice");
        let follower = create_test_user("u2", "bob");
        let sub = create_test_subscription("s1", &channel_id, "u2");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[channel]])
                .append_query_results([[follower]])
                .into_connection(),
        );
        let sub_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub]])
                .into_connection(),
        );

        let service = create_service(sub_db, user_db);
        let cards = service.subscribers(&channel_id, 1, 10).await.unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].username, "bob");
    }
}
