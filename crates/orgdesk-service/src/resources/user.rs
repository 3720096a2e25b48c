//! Users.

use super::RelationLoader;
use crate::dto::{UserDetail, UserView};
use crate::image_store::ImageStore;
use crate::resource::Resource;
use crate::forms::UserForm;
use async_trait::async_trait;
use orgdesk_core::{
    Actor, DivisionId, Field, ListQuery, NewUser, OrgdeskResult, Page, PositionId, RoleId, UploadedFile, User,
    UserId, UserSort,
};
use orgdesk_repository::{AccessTokenRepository, UserRepository};
use orgdesk_security::PasswordHasherInterface;
use std::sync::Arc;
use tracing::{info, warn};

/// User accounts, with password hashing, profile images and role links.
pub struct UserResource {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn AccessTokenRepository>,
    relations: RelationLoader,
    hasher: Arc<dyn PasswordHasherInterface>,
    images: Arc<dyn ImageStore>,
}

impl UserResource {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn AccessTokenRepository>,
        relations: RelationLoader,
        hasher: Arc<dyn PasswordHasherInterface>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            users,
            tokens,
            relations,
            hasher,
            images,
        }
    }

    async fn store_image(&self, image: Field<UploadedFile>) -> OrgdeskResult<Option<String>> {
        match image {
            Field::Value(file) => Ok(Some(self.images.store(&file).await?)),
            Field::Missing | Field::Null => Ok(None),
        }
    }

    /// Best-effort removal; a leftover file never fails the request.
    async fn discard_image(&self, path: &str) {
        if let Err(e) = self.images.delete(path).await {
            warn!("Failed to delete profile image {}: {}", path, e);
        }
    }
}

/// Role ids in request order, without repeats.
fn role_ids(ids: Vec<i64>) -> Vec<RoleId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids.into_iter().map(RoleId) {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[async_trait]
impl Resource for UserResource {
    const NAME: &'static str = "User";
    const SEARCHABLE: bool = true;

    type Id = UserId;
    type Entity = User;
    type Sort = UserSort;
    type Summary = UserView;
    type Detail = UserDetail;
    type Form = UserForm;

    fn id(entity: &User) -> UserId {
        entity.id
    }

    async fn page(&self, query: &ListQuery<UserSort>) -> OrgdeskResult<Page<UserView>> {
        let mut page = self.users.find_all(query).await?;
        let views = self.relations.views(std::mem::take(&mut page.data)).await?;
        Ok(page.with_data(views))
    }

    async fn load(&self, id: UserId) -> OrgdeskResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn detail(&self, user: User) -> OrgdeskResult<UserDetail> {
        let manager = match user.manager_id {
            Some(id) => self.users.find_by_id(id).await?,
            None => None,
        };
        let view = self.relations.view(user).await?;
        Ok(UserDetail { view, manager })
    }

    async fn insert(&self, form: UserForm, actor: Actor) -> OrgdeskResult<User> {
        let password_hash = self.hasher.hash(&form.u_password.require("u_password")?)?;
        let roles = role_ids(form.roles.into_option().unwrap_or_default());

        let mut user = NewUser {
            employee_id: form.u_employee_id.require("u_employee_id")?,
            name: form.u_name.require("u_name")?,
            email: form.u_email.require("u_email")?.to_lowercase(),
            password_hash,
            phone: form.u_phone.into_option(),
            address: form.u_address.into_option(),
            birthdate: form.u_birthdate.into_option(),
            join_date: form.u_join_date.require("u_join_date")?,
            profile_image: None,
            division_id: form.u_division_id.map(DivisionId).into_option(),
            position_id: form.u_position_id.map(PositionId).into_option(),
            is_manager: form.u_is_manager.into_option().unwrap_or(false),
            manager_id: form.u_manager_id.map(UserId).into_option(),
            is_active: form.u_is_active.into_option().unwrap_or(true),
            created_by: actor.audit_value(),
        };
        user.profile_image = self.store_image(form.u_profile_image).await?;

        match self.users.insert(&user, &roles).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if let Some(path) = &user.profile_image {
                    self.discard_image(path).await;
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, mut user: User, form: UserForm, actor: Actor) -> OrgdeskResult<User> {
        if let Some(password) = form.u_password.into_option() {
            user.password_hash = self.hasher.hash(&password)?;
        }
        user.employee_id = form.u_employee_id.require("u_employee_id")?;
        user.name = form.u_name.require("u_name")?;
        user.email = form.u_email.require("u_email")?.to_lowercase();
        user.phone = form.u_phone.resolve(user.phone.take());
        user.address = form.u_address.resolve(user.address.take());
        user.birthdate = form.u_birthdate.resolve(user.birthdate);
        user.join_date = form.u_join_date.require("u_join_date")?;
        user.division_id = form.u_division_id.map(DivisionId).resolve(user.division_id);
        user.position_id = form.u_position_id.map(PositionId).resolve(user.position_id);
        user.is_manager = form.u_is_manager.or_keep(user.is_manager);
        user.manager_id = form.u_manager_id.map(UserId).resolve(user.manager_id);
        let was_active = user.is_active;
        user.is_active = form.u_is_active.or_keep(user.is_active);
        user.updated_by = Some(actor.audit_value());
        let roles = form.roles.into_option().map(role_ids);

        let old_image = user.profile_image.clone();
        let image = form.u_profile_image;
        let cleared = matches!(image, Field::Null);
        let new_image = self.store_image(image).await?;
        if new_image.is_some() || cleared {
            user.profile_image.clone_from(&new_image);
        }

        match self.users.update(&user, roles.as_deref()).await {
            Ok(updated) => {
                if let Some(old) = old_image.filter(|old| updated.profile_image.as_ref() != Some(old)) {
                    self.discard_image(&old).await;
                }
                if was_active && !updated.is_active {
                    let revoked = self.tokens.delete_for_user(updated.id).await?;
                    info!("Deactivated user {} and revoked {} token(s)", updated.id, revoked);
                }
                Ok(updated)
            }
            Err(e) => {
                if let Some(new) = new_image.filter(|new| old_image.as_ref() != Some(new)) {
                    self.discard_image(&new).await;
                }
                Err(e)
            }
        }
    }

    async fn count_dependents(&self, user: &User) -> OrgdeskResult<u64> {
        self.users.count_subordinates(user.id).await
    }

    fn dependents_message() -> String {
        "Cannot delete user. Other users report to this user.".to_string()
    }

    async fn remove(&self, user: User) -> OrgdeskResult<()> {
        self.users.delete(user.id).await?;
        if let Some(path) = &user.profile_image {
            self.discard_image(path).await;
        }
        Ok(())
    }
}

impl std::fmt::Debug for UserResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserResource").finish_non_exhaustive()
    }
}
