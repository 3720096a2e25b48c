//! Batch loading of user relations.

use super::distinct;
use crate::dto::{RecentUser, UserView, UserWithDivision, UserWithPosition};
use orgdesk_core::{Division, DivisionId, OrgdeskResult, Position, PositionId, Role, RoleId, User, UserId};
use orgdesk_repository::{DivisionRepository, PositionRepository, RoleRepository, UserRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// Loads divisions, positions and roles for a batch of users with one query
/// per relation.
#[derive(Clone)]
pub struct RelationLoader {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    divisions: Arc<dyn DivisionRepository>,
    positions: Arc<dyn PositionRepository>,
}

impl RelationLoader {
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

    async fn divisions_of(&self, users: &[User]) -> OrgdeskResult<HashMap<DivisionId, Division>> {
        let ids = distinct(users.iter().filter_map(|u| u.division_id).collect());
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let divisions = self.divisions.find_by_ids(&ids).await?;
        Ok(divisions.into_iter().map(|d| (d.id, d)).collect())
    }

    async fn positions_of(&self, users: &[User]) -> OrgdeskResult<HashMap<PositionId, Position>> {
        let ids = distinct(users.iter().filter_map(|u| u.position_id).collect());
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let positions = self.positions.find_by_ids(&ids).await?;
        Ok(positions.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn roles_of(&self, users: &[User]) -> OrgdeskResult<HashMap<UserId, Vec<Role>>> {
        let user_ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let links = self.users.role_links(&user_ids).await?;
        let role_ids: Vec<RoleId> = distinct(links.iter().map(|(_, role)| *role).collect());
        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let roles: HashMap<RoleId, Role> = self
            .roles
            .find_by_ids(&role_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut by_user: HashMap<UserId, Vec<Role>> = HashMap::new();
        for (user, role) in links {
            if let Some(role) = roles.get(&role) {
                by_user.entry(user).or_default().push(role.clone());
            }
        }
        Ok(by_user)
    }

    /// Attaches division, position and roles.
    pub async fn views(&self, users: Vec<User>) -> OrgdeskResult<Vec<UserView>> {
        let divisions = self.divisions_of(&users).await?;
        let positions = self.positions_of(&users).await?;
        let mut roles = self.roles_of(&users).await?;

        Ok(users
            .into_iter()
            .map(|user| UserView {
                division: user.division_id.and_then(|id| divisions.get(&id).cloned()),
                position: user.position_id.and_then(|id| positions.get(&id).cloned()),
                roles: roles.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect())
    }

    pub async fn view(&self, user: User) -> OrgdeskResult<UserView> {
        let mut views = self.views(vec![user]).await?;
        views
            .pop()
            .ok_or_else(|| orgdesk_core::OrgdeskError::internal("user view was not built"))
    }

    pub async fn with_positions(&self, users: Vec<User>) -> OrgdeskResult<Vec<UserWithPosition>> {
        let positions = self.positions_of(&users).await?;
        Ok(users
            .into_iter()
            .map(|user| UserWithPosition {
                position: user.position_id.and_then(|id| positions.get(&id).cloned()),
                user,
            })
            .collect())
    }

    pub async fn with_divisions(&self, users: Vec<User>) -> OrgdeskResult<Vec<UserWithDivision>> {
        let divisions = self.divisions_of(&users).await?;
        Ok(users
            .into_iter()
            .map(|user| UserWithDivision {
                division: user.division_id.and_then(|id| divisions.get(&id).cloned()),
                user,
            })
            .collect())
    }

    /// Attaches division and position, for the dashboard.
    pub async fn recent(&self, users: Vec<User>) -> OrgdeskResult<Vec<RecentUser>> {
        let divisions = self.divisions_of(&users).await?;
        let positions = self.positions_of(&users).await?;
        Ok(users
            .into_iter()
            .map(|user| RecentUser {
                division: user.division_id.and_then(|id| divisions.get(&id).cloned()),
                position: user.position_id.and_then(|id| positions.get(&id).cloned()),
                user,
            })
            .collect())
    }
}

impl std::fmt::Debug for RelationLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationLoader").finish_non_exhaustive()
    }
}
