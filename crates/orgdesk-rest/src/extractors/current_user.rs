//! Authenticated-user extractors.

use crate::responses::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use orgdesk_core::{Actor, OrgdeskError};
use orgdesk_service::Authenticated;

/// Extractor for the user resolved by the auth middleware.
pub struct CurrentUser(pub Authenticated);

impl std::ops::Deref for CurrentUser {
    type Target = Authenticated;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError(OrgdeskError::unauthenticated()))
    }
}

/// The actor a mutation is attributed to: the authenticated user, or the
/// system sentinel when the request carries none.
pub struct RequestActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<Authenticated>().map(|auth| auth.user.id);
        Ok(RequestActor(Actor::from_user(user)))
    }
}
