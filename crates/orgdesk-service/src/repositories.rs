//! The repository handles shared by every service.

use crate::lookup::RepositoryRuleLookup;
use crate::resources::RelationLoader;
use orgdesk_core::RuleLookup;
use orgdesk_repository::{
    AccessTokenRepository, DivisionRepository, PositionRepository, RoleRepository, UserRepository,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub divisions: Arc<dyn DivisionRepository>,
    pub positions: Arc<dyn PositionRepository>,
    pub tokens: Arc<dyn AccessTokenRepository>,
}

impl Repositories {
    /// Uses one store for every repository.
    pub fn shared<D>(db: &Arc<D>) -> Self
    where
        D: UserRepository
            + RoleRepository
            + DivisionRepository
            + PositionRepository
            + AccessTokenRepository
            + 'static,
    {
        Self {
            users: Arc::clone(db) as Arc<dyn UserRepository>,
            roles: Arc::clone(db) as Arc<dyn RoleRepository>,
            divisions: Arc::clone(db) as Arc<dyn DivisionRepository>,
            positions: Arc::clone(db) as Arc<dyn PositionRepository>,
            tokens: Arc::clone(db) as Arc<dyn AccessTokenRepository>,
        }
    }

    #[must_use]
    pub fn relations(&self) -> RelationLoader {
        RelationLoader::new(
            Arc::clone(&self.users),
            Arc::clone(&self.roles),
            Arc::clone(&self.divisions),
            Arc::clone(&self.positions),
        )
    }

    /// Lookup backing the uniqueness and existence checks of forms.
    #[must_use]
    pub fn rule_lookup(&self) -> Arc<dyn RuleLookup> {
        Arc::new(RepositoryRuleLookup::new(
            Arc::clone(&self.users),
            Arc::clone(&self.roles),
            Arc::clone(&self.divisions),
            Arc::clone(&self.positions),
        ))
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
