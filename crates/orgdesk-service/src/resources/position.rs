//! Positions.

use super::division::new_entry;
use super::RelationLoader;
use crate::dto::PositionDetail;
use crate::resource::{ListActive, Resource};
use crate::forms::PositionForm;
use async_trait::async_trait;
use orgdesk_core::{Actor, ListQuery, OrgdeskResult, Page, Position, PositionId, PositionSort};
use orgdesk_repository::{PositionRepository, UserRepository};
use std::sync::Arc;

pub struct PositionResource {
    positions: Arc<dyn PositionRepository>,
    users: Arc<dyn UserRepository>,
    relations: RelationLoader,
}

impl PositionResource {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        users: Arc<dyn UserRepository>,
        relations: RelationLoader,
    ) -> Self {
        Self {
            positions,
            users,
            relations,
        }
    }
}

#[async_trait]
impl Resource for PositionResource {
    const NAME: &'static str = "Position";

    type Id = PositionId;
    type Entity = Position;
    type Sort = PositionSort;
    type Summary = Position;
    type Detail = PositionDetail;
    type Form = PositionForm;

    fn id(entity: &Position) -> PositionId {
        entity.id
    }

    async fn page(&self, query: &ListQuery<PositionSort>) -> OrgdeskResult<Page<Position>> {
        self.positions.find_all(query).await
    }

    async fn load(&self, id: PositionId) -> OrgdeskResult<Option<Position>> {
        self.positions.find_by_id(id).await
    }

    async fn detail(&self, position: Position) -> OrgdeskResult<PositionDetail> {
        let users = self.users.find_by_position(position.id).await?;
        let users = self.relations.with_divisions(users).await?;
        Ok(PositionDetail { position, users })
    }

    async fn insert(&self, form: PositionForm, actor: Actor) -> OrgdeskResult<Position> {
        let entry = new_entry(form.into_values()?, actor);
        self.positions.insert(&entry).await
    }

    async fn apply(&self, mut position: Position, form: PositionForm, actor: Actor) -> OrgdeskResult<Position> {
        let values = form.into_values()?;
        position.code = values.code;
        position.name = values.name;
        position.is_active = values.is_active.or_keep(position.is_active);
        position.updated_by = Some(actor.audit_value());
        self.positions.update(&position).await
    }

    async fn count_dependents(&self, position: &Position) -> OrgdeskResult<u64> {
        self.positions.count_users(position.id).await
    }

    async fn remove(&self, position: Position) -> OrgdeskResult<()> {
        self.positions.delete(position.id).await?;
        Ok(())
    }
}

#[async_trait]
impl ListActive for PositionResource {
    async fn active(&self) -> OrgdeskResult<Vec<Position>> {
        self.positions.find_active().await
    }
}

impl std::fmt::Debug for PositionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionResource").finish_non_exhaustive()
    }
}
