//! Channel profile composer.
//!
//! A "channel" is a user viewed in its content-publishing role. The
//! profile view cross-references the subscription relation twice (both
//! directions) plus a viewer membership check, and merges the results
//! into one record.

use playtube_common::{AppError, AppResult};
use playtube_db::repositories::{SubscriptionRepository, UserRepository};
use serde::Serialize;

/// Composed channel profile with derived counters and viewer flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub full_name: String,
    pub username: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub email: String,
    pub subscriber_count: u64,
    pub subscribed_to_count: u64,
    pub viewer_is_subscribed: bool,
}

/// Channel service for profile aggregation.
#[derive(Clone)]
pub struct ChannelService {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
}

impl ChannelService {
    /// Create a new channel service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, subscription_repo: SubscriptionRepository) -> Self {
        Self {
            user_repo,
            subscription_repo,
        }
    }

    /// Compose the channel profile for a username, as seen by a viewer.
    ///
    /// After the username resolves, the two counters and the membership
    /// check are independent and run concurrently. Anonymous viewers get
    /// `viewer_is_subscribed = false` without a membership query. The
    /// password hash and refresh token never reach the output type.
    pub async fn profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ChannelProfile> {
        let channel = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let (subscriber_count, subscribed_to_count, viewer_is_subscribed) = tokio::try_join!(
            self.subscription_repo.count_subscribers(&channel.id),
            self.subscription_repo.count_subscribed_to(&channel.id),
            async {
                match viewer_id {
                    Some(viewer_id) => {
                        self.subscription_repo
                            .is_subscribed(&channel.id, viewer_id)
                            .await
                    }
                    None => Ok(false),
                }
            },
        )?;

        Ok(ChannelProfile {
            full_name: channel.full_name,
            username: channel.username,
            avatar_url: channel.avatar_url,
            cover_image_url: channel.cover_image_url,
            email: channel.email,
            subscriber_count,
            subscribed_to_count,
            viewer_is_subscribed,
        })
    }
}
