//! The CRUD workflow shared by every entity.

use async_trait::async_trait;
use crate::forms::{parse_form, RequestForm};
use orgdesk_core::{
    Actor, ListParams, ListQuery, OrgdeskError, OrgdeskResult, Page, PagingPolicy, Payload, RuleLookup, SortColumn,
};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the generic workflow needs to know about one entity.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Display name used in messages ("User", "Role", ...).
    const NAME: &'static str;
    /// Whether list requests honor the `search` parameter.
    const SEARCHABLE: bool = false;

    type Id: Copy + Display + FromStr + Into<i64> + Send + Sync;
    type Entity: Serialize + Send + Sync;
    type Sort: SortColumn;
    type Summary: Serialize + Send;
    type Detail: Serialize + Send;
    /// Request body of create and update.
    type Form: RequestForm;

    fn id(entity: &Self::Entity) -> Self::Id;

    async fn page(&self, query: &ListQuery<Self::Sort>) -> OrgdeskResult<Page<Self::Summary>>;

    async fn load(&self, id: Self::Id) -> OrgdeskResult<Option<Self::Entity>>;

    /// Loads the relations shown by show/create/update.
    async fn detail(&self, entity: Self::Entity) -> OrgdeskResult<Self::Detail>;

    async fn insert(&self, form: Self::Form, actor: Actor) -> OrgdeskResult<Self::Entity>;

    async fn apply(&self, entity: Self::Entity, form: Self::Form, actor: Actor) -> OrgdeskResult<Self::Entity>;

    /// Records that block deletion.
    async fn count_dependents(&self, entity: &Self::Entity) -> OrgdeskResult<u64>;

    /// Message returned when dependents block deletion.
    fn dependents_message() -> String {
        format!(
            "Cannot delete {}. It has associated users.",
            Self::NAME.to_lowercase()
        )
    }

    /// Deletes the entity and its association rows.
    async fn remove(&self, entity: Self::Entity) -> OrgdeskResult<()>;
}

/// A resource exposing its active records as an unpaginated list.
#[async_trait]
pub trait ListActive: Resource {
    /// Active records ordered by primary key.
    async fn active(&self) -> OrgdeskResult<Vec<Self::Entity>>;
}

/// Runs list/show/store/update/destroy for one [`Resource`].
pub struct ResourceHandler<R> {
    resource: R,
    lookup: Arc<dyn RuleLookup>,
    paging: PagingPolicy,
}

impl<R: Resource> ResourceHandler<R> {
    pub fn new(resource: R, lookup: Arc<dyn RuleLookup>, paging: PagingPolicy) -> Self {
        Self {
            resource,
            lookup,
            paging,
        }
    }

    /// Lists one page. Malformed parameters fall back to their defaults.
    pub async fn list(&self, params: &ListParams) -> OrgdeskResult<Page<R::Summary>> {
        let mut query = ListQuery::<R::Sort>::from_params(params, self.paging);
        if !R::SEARCHABLE {
            query = query.without_search();
        }
        debug!(
            "Listing {}: page {}, size {}, sort {}",
            R::NAME,
            query.page.page,
            query.page.per_page,
            query.sort.to_sql()
        );
        self.resource.page(&query).await
    }

    pub async fn create(&self, payload: Payload, actor: Actor) -> OrgdeskResult<R::Detail> {
        debug!("Creating {}", R::NAME);
        let form = parse_form::<R::Form>(payload, None, self.lookup.as_ref()).await?;
        let entity = self.resource.insert(form, actor).await?;
        info!("{} created: {}", R::NAME, R::id(&entity));
        self.resource.detail(entity).await
    }

    /// Parses a path id. Anything that is not an id matches no record.
    pub fn parse_id(raw: &str) -> OrgdeskResult<R::Id> {
        raw.parse().map_err(|_| OrgdeskError::not_found(R::NAME))
    }

    pub async fn get(&self, id: R::Id) -> OrgdeskResult<R::Detail> {
        debug!("Getting {}: {}", R::NAME, id);
        let entity = self.find(id).await?;
        self.resource.detail(entity).await
    }

    pub async fn update(&self, id: R::Id, payload: Payload, actor: Actor) -> OrgdeskResult<R::Detail> {
        debug!("Updating {}: {}", R::NAME, id);
        let entity = self.find(id).await?;
        let current = Some(R::id(&entity).into());
        let form = parse_form::<R::Form>(payload, current, self.lookup.as_ref()).await?;
        let updated = self.resource.apply(entity, form, actor).await?;
        info!("{} updated: {}", R::NAME, id);
        self.resource.detail(updated).await
    }

    pub async fn delete(&self, id: R::Id) -> OrgdeskResult<()> {
        debug!("Deleting {}: {}", R::NAME, id);
        let entity = self.find(id).await?;

        let dependents = self.resource.count_dependents(&entity).await?;
        if dependents > 0 {
            warn!("{} {} not deleted: {} dependent records", R::NAME, id, dependents);
            return Err(OrgdeskError::conflict(R::dependents_message()));
        }

        self.resource.remove(entity).await?;
        info!("{} deleted: {}", R::NAME, id);
        Ok(())
    }

    async fn find(&self, id: R::Id) -> OrgdeskResult<R::Entity> {
        self.resource
            .load(id)
            .await?
            .ok_or_else(|| OrgdeskError::not_found(R::NAME))
    }
}

impl<R: ListActive> ResourceHandler<R> {
    pub async fn list_all_active(&self) -> OrgdeskResult<Vec<R::Entity>> {
        debug!("Listing active {}", R::NAME);
        self.resource.active().await
    }
}

impl<R> std::fmt::Debug for ResourceHandler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{payload, Fixture};
    use orgdesk_core::{RoleId, UserId};
    use serde_json::json;

    fn list_params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "page" => params.page = value,
                "per_page" => params.per_page = value,
                "sort_by" => params.sort_by = value,
                "sort_order" => params.sort_order = value,
                "search" => params.search = value,
                _ => {}
            }
        }
        params
    }

    #[tokio::test]
    async fn test_create_stamps_actor_and_defaults_active() {
        let fx = Fixture::new();
        let role = fx
            .handlers
            .roles
            .create(payload(json!({ "role_name": "Admin", "role_level": 10 })), Actor::User(UserId(7)))
            .await
            .unwrap();

        assert!(role.role.is_active);
        assert_eq!(role.role.created_by.as_deref(), Some("7"));
        assert!(role.users.is_empty());
    }

    #[tokio::test]
    async fn test_create_without_actor_uses_system() {
        let fx = Fixture::new();
        let division = fx
            .handlers
            .divisions
            .create(payload(json!({ "div_code": "ENG", "div_name": "Engineering" })), Actor::System)
            .await
            .unwrap();
        assert_eq!(division.division.created_by.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_validation_accumulates_across_fields() {
        let fx = Fixture::new();
        let err = fx
            .handlers
            .roles
            .create(payload(json!({ "role_level": 100_001 })), Actor::System)
            .await
            .unwrap_err();

        let errors = err.field_errors().unwrap();
        assert_eq!(errors["role_name"], vec!["The role name field is required."]);
        assert_eq!(errors["role_level"], vec!["The role level must not be greater than 100000."]);
    }

    #[tokio::test]
    async fn test_update_excludes_self_from_uniqueness() {
        let fx = Fixture::new();
        let eng = fx.division("ENG", true).await;
        fx.division("OPS", true).await;
        let divisions = &fx.handlers.divisions;

        let same = divisions
            .update(eng, payload(json!({ "div_code": "ENG", "div_name": "Renamed" })), Actor::System)
            .await
            .unwrap();
        assert_eq!(same.division.name, "Renamed");
        assert_eq!(same.division.updated_by.as_deref(), Some("system"));

        let err = divisions
            .update(eng, payload(json!({ "div_code": "OPS", "div_name": "Clash" })), Actor::System)
            .await
            .unwrap_err();
        assert_eq!(err.field_errors().unwrap()["div_code"], vec!["The div code has already been taken."]);
    }

    #[tokio::test]
    async fn test_update_keeps_active_flag_when_omitted() {
        let fx = Fixture::new();
        let legacy = fx.role("Legacy", false).await;

        let updated = fx
            .handlers
            .roles
            .update(legacy.id, payload(json!({ "role_name": "Legacy", "role_level": 2 })), Actor::System)
            .await
            .unwrap();
        assert!(!updated.role.is_active);
        assert_eq!(updated.role.level, 2);
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let fx = Fixture::new();
        let roles = &fx.handlers.roles;

        let err = roles.get(RoleId(404)).await.unwrap_err();
        assert_eq!(err.to_string(), "Role not found");
        assert!(roles.update(RoleId(404), Payload::new(), Actor::System).await.is_err());
        assert_eq!(roles.delete(RoleId(404)).await.unwrap_err().status_code(), 404);
        assert_eq!(
            crate::RoleHandler::parse_id("abc").unwrap_err().to_string(),
            "Role not found"
        );
    }

    #[tokio::test]
    async fn test_delete_blocked_by_dependents() {
        let fx = Fixture::new();
        let eng = fx.division("ENG", true).await;
        let mut user = fx.user("E001", "ada@example.com", true).await;
        user.division_id = Some(eng);
        fx.grant(&user, &[]).await;

        let err = fx.handlers.divisions.delete(eng).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Cannot delete division. It has associated users.");

        let ops = fx.division("OPS", true).await;
        fx.handlers.divisions.delete(ops).await.unwrap();
        assert!(fx.handlers.divisions.get(ops).await.is_err());
    }

    #[tokio::test]
    async fn test_role_delete_blocked_by_holders() {
        let fx = Fixture::new();
        let admin = fx.role("Admin", true).await;
        let user = fx.user("E001", "ada@example.com", true).await;
        fx.grant(&user, &[admin.id]).await;

        let err = fx.handlers.roles.delete(admin.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete role. It has associated users.");
    }

    #[tokio::test]
    async fn test_list_sorts_and_paginates() {
        let fx = Fixture::new();
        for code in ["B", "A", "C"] {
            fx.position(code, true).await;
        }

        let page = fx
            .handlers
            .positions
            .list(&list_params(&[("sort_by", "pos_code"), ("sort_order", "desc"), ("per_page", "2")]))
            .await
            .unwrap();
        let codes: Vec<_> = page.data.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "B"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 2);
    }

    #[tokio::test]
    async fn test_list_unknown_sort_falls_back_to_id() {
        let fx = Fixture::new();
        for code in ["B", "A"] {
            fx.position(code, true).await;
        }

        let page = fx
            .handlers
            .positions
            .list(&list_params(&[("sort_by", "pos_name; DROP TABLE login_users")]))
            .await
            .unwrap();
        let codes: Vec<_> = page.data.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_search_only_applies_to_users() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        fx.user("E002", "bob@example.com", true).await;
        fx.division("ENG", true).await;

        let users = fx.handlers.users.list(&list_params(&[("search", "ADA")])).await.unwrap();
        assert_eq!(users.total, 1);
        assert_eq!(users.data[0].user.email, "ada@example.com");

        let divisions = fx
            .handlers
            .divisions
            .list(&list_params(&[("search", "nothing-matches")]))
            .await
            .unwrap();
        assert_eq!(divisions.total, 1);
    }

    #[tokio::test]
    async fn test_list_all_active() {
        let fx = Fixture::new();
        fx.role("Admin", true).await;
        fx.role("Legacy", false).await;
        fx.role("Staff", true).await;

        let active = fx.handlers.roles.list_all_active().await.unwrap();
        let names: Vec<_> = active.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Admin", "Staff"]);
    }
}
