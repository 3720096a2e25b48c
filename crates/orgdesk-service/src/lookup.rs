//! Storage lookups for uniqueness and existence checks.

use async_trait::async_trait;
use orgdesk_core::{
    DivisionId, ExistsTarget, OrgdeskResult, PositionId, RoleId, RuleLookup, UniqueKey, UserId,
};
use orgdesk_repository::{DivisionRepository, PositionRepository, RoleRepository, UserRepository};
use std::sync::Arc;

/// Answers rule lookups from the repositories.
#[derive(Clone)]
pub struct RepositoryRuleLookup {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    divisions: Arc<dyn DivisionRepository>,
    positions: Arc<dyn PositionRepository>,
}

impl RepositoryRuleLookup {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        divisions: Arc<dyn DivisionRepository>,
        positions: Arc<dyn PositionRepository>,
    ) -> Self {
        Self {
            users,
            roles,
            divisions,
            positions,
        }
    }
}

#[async_trait]
impl RuleLookup for RepositoryRuleLookup {
    async fn is_taken(&self, key: UniqueKey, value: &str, ignore: Option<i64>) -> OrgdeskResult<bool> {
        match key {
            UniqueKey::UserEmployeeId => {
                self.users
                    .exists_by_employee_id(value, ignore.map(UserId))
                    .await
            }
            UniqueKey::UserEmail => {
                self.users
                    .exists_by_email(&value.to_lowercase(), ignore.map(UserId))
                    .await
            }
            UniqueKey::RoleName => self.roles.exists_by_name(value, ignore.map(RoleId)).await,
            UniqueKey::DivisionCode => {
                self.divisions
                    .exists_by_code(value, ignore.map(DivisionId))
                    .await
            }
            UniqueKey::PositionCode => {
                self.positions
                    .exists_by_code(value, ignore.map(PositionId))
                    .await
            }
        }
    }

    async fn exists(&self, target: ExistsTarget, id: i64) -> OrgdeskResult<bool> {
        Ok(match target {
            ExistsTarget::User => self.users.find_by_id(UserId(id)).await?.is_some(),
            ExistsTarget::Role => self.roles.find_by_id(RoleId(id)).await?.is_some(),
            ExistsTarget::Division => self.divisions.find_by_id(DivisionId(id)).await?.is_some(),
            ExistsTarget::Position => self.positions.find_by_id(PositionId(id)).await?.is_some(),
        })
    }
}

impl std::fmt::Debug for RepositoryRuleLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRuleLookup").finish_non_exhaustive()
    }
}
