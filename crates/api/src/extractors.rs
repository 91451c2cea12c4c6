//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use playtube_common::AppError;
use playtube_db::entities::user;

/// Authenticated user extractor.
///
/// The auth middleware resolves the session token and stores the user in
/// request extensions; this extractor makes the identity an explicit
/// handler parameter. Missing identity rejects with the uniform
/// `Unauthorized` envelope.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor, for viewer-sensitive reads
/// that also serve anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    /// The viewer's user ID, if authenticated.
    #[must_use]
    pub fn viewer_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}
