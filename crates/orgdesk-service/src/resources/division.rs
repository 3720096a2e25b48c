//! Divisions.

use super::RelationLoader;
use crate::dto::DivisionDetail;
use crate::resource::{ListActive, Resource};
use crate::forms::{CatalogValues, DivisionForm};
use async_trait::async_trait;
use orgdesk_core::{
    Actor, Division, DivisionId, DivisionSort, ListQuery, NewCatalogEntry, OrgdeskResult, Page,
};
use orgdesk_repository::{DivisionRepository, UserRepository};
use std::sync::Arc;

pub struct DivisionResource {
    divisions: Arc<dyn DivisionRepository>,
    users: Arc<dyn UserRepository>,
    relations: RelationLoader,
}

impl DivisionResource {
    pub fn new(
        divisions: Arc<dyn DivisionRepository>,
        users: Arc<dyn UserRepository>,
        relations: RelationLoader,
    ) -> Self {
        Self {
            divisions,
            users,
            relations,
        }
    }
}

pub(super) fn new_entry(values: CatalogValues, actor: Actor) -> NewCatalogEntry {
    NewCatalogEntry {
        code: values.code,
        name: values.name,
        is_active: values.is_active.into_option().unwrap_or(true),
        created_by: actor.audit_value(),
    }
}

#[async_trait]
impl Resource for DivisionResource {
    const NAME: &'static str = "Division";

    type Id = DivisionId;
    type Entity = Division;
    type Sort = DivisionSort;
    type Summary = Division;
    type Detail = DivisionDetail;
    type Form = DivisionForm;

    fn id(entity: &Division) -> DivisionId {
        entity.id
    }

    async fn page(&self, query: &ListQuery<DivisionSort>) -> OrgdeskResult<Page<Division>> {
        self.divisions.find_all(query).await
    }

    async fn load(&self, id: DivisionId) -> OrgdeskResult<Option<Division>> {
        self.divisions.find_by_id(id).await
    }

    async fn detail(&self, division: Division) -> OrgdeskResult<DivisionDetail> {
        let users = self.users.find_by_division(division.id).await?;
        let users = self.relations.with_positions(users).await?;
        Ok(DivisionDetail { division, users })
    }

    async fn insert(&self, form: DivisionForm, actor: Actor) -> OrgdeskResult<Division> {
        let entry = new_entry(form.into_values()?, actor);
        self.divisions.insert(&entry).await
    }

    async fn apply(&self, mut division: Division, form: DivisionForm, actor: Actor) -> OrgdeskResult<Division> {
        let values = form.into_values()?;
        division.code = values.code;
        division.name = values.name;
        division.is_active = values.is_active.or_keep(division.is_active);
        division.updated_by = Some(actor.audit_value());
        self.divisions.update(&division).await
    }

    async fn count_dependents(&self, division: &Division) -> OrgdeskResult<u64> {
        self.divisions.count_users(division.id).await
    }

    async fn remove(&self, division: Division) -> OrgdeskResult<()> {
        self.divisions.delete(division.id).await?;
        Ok(())
    }
}

#[async_trait]
impl ListActive for DivisionResource {
    async fn active(&self) -> OrgdeskResult<Vec<Division>> {
        self.divisions.find_active().await
    }
}

impl std::fmt::Debug for DivisionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DivisionResource").finish_non_exhaustive()
    }
}
