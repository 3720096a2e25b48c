//! Per-entity [`Resource`](crate::Resource) implementations.

mod division;
mod position;
mod relations;
mod role;
mod user;

pub use division::DivisionResource;
pub use position::PositionResource;
pub use relations::RelationLoader;
pub use role::RoleResource;
pub use user::UserResource;

use crate::image_store::ImageStore;
use crate::repositories::Repositories;
use crate::resource::ResourceHandler;
use orgdesk_core::PagingPolicy;
use orgdesk_security::PasswordHasherInterface;
use std::sync::Arc;

/// Handler serving `/users`.
pub type UserHandler = crate::ResourceHandler<UserResource>;
/// Handler serving `/roles`.
pub type RoleHandler = crate::ResourceHandler<RoleResource>;
/// Handler serving `/divisions`.
pub type DivisionHandler = crate::ResourceHandler<DivisionResource>;
/// Handler serving `/positions`.
pub type PositionHandler = crate::ResourceHandler<PositionResource>;

/// The four CRUD handlers, built over one set of repositories.
#[derive(Clone)]
pub struct ResourceHandlers {
    pub users: Arc<UserHandler>,
    pub roles: Arc<RoleHandler>,
    pub divisions: Arc<DivisionHandler>,
    pub positions: Arc<PositionHandler>,
}

impl ResourceHandlers {
    pub fn build(
        repos: &Repositories,
        hasher: Arc<dyn PasswordHasherInterface>,
        images: Arc<dyn ImageStore>,
        paging: PagingPolicy,
    ) -> Self {
        let lookup = repos.rule_lookup();
        let relations = repos.relations();

        Self {
            users: Arc::new(ResourceHandler::new(
                UserResource::new(
                    Arc::clone(&repos.users),
                    Arc::clone(&repos.tokens),
                    relations.clone(),
                    hasher,
                    images,
                ),
                Arc::clone(&lookup),
                paging,
            )),
            roles: Arc::new(ResourceHandler::new(
                RoleResource::new(Arc::clone(&repos.roles), Arc::clone(&repos.users)),
                Arc::clone(&lookup),
                paging,
            )),
            divisions: Arc::new(ResourceHandler::new(
                DivisionResource::new(Arc::clone(&repos.divisions), Arc::clone(&repos.users), relations.clone()),
                Arc::clone(&lookup),
                paging,
            )),
            positions: Arc::new(ResourceHandler::new(
                PositionResource::new(Arc::clone(&repos.positions), Arc::clone(&repos.users), relations),
                lookup,
                paging,
            )),
        }
    }
}

impl std::fmt::Debug for ResourceHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandlers").finish_non_exhaustive()
    }
}

/// Sorts and removes duplicates.
pub(crate) fn distinct<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items.dedup();
    items
}
