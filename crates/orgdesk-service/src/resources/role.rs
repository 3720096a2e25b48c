//! Roles.

use crate::dto::RoleDetail;
use crate::resource::{ListActive, Resource};
use crate::forms::RoleForm;
use async_trait::async_trait;
use orgdesk_core::{
    Actor, Field, ListQuery, NewRole, OrgdeskError, OrgdeskResult, Page, Role, RoleId, RoleSort, RoleSummary,
};
use orgdesk_repository::{RoleRepository, UserRepository};
use std::sync::Arc;

pub struct RoleResource {
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
}

impl RoleResource {
    pub fn new(roles: Arc<dyn RoleRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { roles, users }
    }
}

fn level(level: Field<i64>) -> OrgdeskResult<i32> {
    let level = level.require("role_level")?;
    i32::try_from(level).map_err(|_| OrgdeskError::internal(format!("role level {level} out of range")))
}

#[async_trait]
impl Resource for RoleResource {
    const NAME: &'static str = "Role";

    type Id = RoleId;
    type Entity = Role;
    type Sort = RoleSort;
    type Summary = RoleSummary;
    type Detail = RoleDetail;
    type Form = RoleForm;

    fn id(entity: &Role) -> RoleId {
        entity.id
    }

    async fn page(&self, query: &ListQuery<RoleSort>) -> OrgdeskResult<Page<RoleSummary>> {
        self.roles.find_all(query).await
    }

    async fn load(&self, id: RoleId) -> OrgdeskResult<Option<Role>> {
        self.roles.find_by_id(id).await
    }

    async fn detail(&self, role: Role) -> OrgdeskResult<RoleDetail> {
        let users = self.users.find_by_role(role.id).await?;
        Ok(RoleDetail { role, users })
    }

    async fn insert(&self, form: RoleForm, actor: Actor) -> OrgdeskResult<Role> {
        let role = NewRole {
            name: form.role_name.require("role_name")?,
            level: level(form.role_level)?,
            is_active: form.role_is_active.into_option().unwrap_or(true),
            created_by: actor.audit_value(),
        };
        self.roles.insert(&role).await
    }

    async fn apply(&self, mut role: Role, form: RoleForm, actor: Actor) -> OrgdeskResult<Role> {
        role.name = form.role_name.require("role_name")?;
        role.level = level(form.role_level)?;
        role.is_active = form.role_is_active.or_keep(role.is_active);
        role.updated_by = Some(actor.audit_value());
        self.roles.update(&role).await
    }

    async fn count_dependents(&self, role: &Role) -> OrgdeskResult<u64> {
        self.roles.count_users(role.id).await
    }

    async fn remove(&self, role: Role) -> OrgdeskResult<()> {
        self.roles.delete(role.id).await?;
        Ok(())
    }
}

#[async_trait]
impl ListActive for RoleResource {
    async fn active(&self) -> OrgdeskResult<Vec<Role>> {
        self.roles.find_active().await
    }
}

impl std::fmt::Debug for RoleResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResource").finish_non_exhaustive()
    }
}
