//! MySQL position repository implementation.

use super::catalog::{CatalogRow, POSITIONS};
use crate::{traits::PositionRepository, DatabasePoolInterface};
use async_trait::async_trait;
use orgdesk_core::{
    Position, PositionId, PositionSort, GroupCount, ListQuery, NewCatalogEntry, OrgdeskResult, Page,
};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// MySQL position repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = PositionRepository)]
pub struct MySqlPositionRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlPositionRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for MySqlPositionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlPositionRepository").finish_non_exhaustive()
    }
}

impl From<CatalogRow> for Position {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: PositionId(row.id),
            code: row.code,
            name: row.name,
            is_active: row.is_active,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PositionRepository for MySqlPositionRepository {
    async fn find_by_id(&self, id: PositionId) -> OrgdeskResult<Option<Position>> {
        debug!("Finding position by id: {}", id);
        Ok(POSITIONS
            .find_by_id(self.pool.inner(), id.into_inner())
            .await?
            .map(Position::from))
    }

    async fn find_by_ids(&self, ids: &[PositionId]) -> OrgdeskResult<Vec<Position>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = POSITIONS.find_by_ids(self.pool.inner(), &raw).await?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn exists_by_code(&self, code: &str, except: Option<PositionId>) -> OrgdeskResult<bool> {
        POSITIONS
            .exists_by_code(self.pool.inner(), code, except.map(PositionId::into_inner))
            .await
    }

    async fn find_all(&self, query: &ListQuery<PositionSort>) -> OrgdeskResult<Page<Position>> {
        debug!("Listing positions: {:?}", query);
        Ok(POSITIONS
            .find_all(self.pool.inner(), query)
            .await?
            .map(Position::from))
    }

    async fn find_active(&self) -> OrgdeskResult<Vec<Position>> {
        let rows = POSITIONS.find_active(self.pool.inner()).await?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn insert(&self, position: &NewCatalogEntry) -> OrgdeskResult<Position> {
        debug!("Inserting position: {}", position.code);
        Ok(POSITIONS.insert(self.pool.inner(), position).await?.into())
    }

    async fn update(&self, position: &Position) -> OrgdeskResult<Position> {
        debug!("Updating position: {}", position.id);
        let row = POSITIONS
            .update(
                self.pool.inner(),
                position.id.into_inner(),
                &position.code,
                &position.name,
                position.is_active,
                position.updated_by.as_deref(),
            )
            .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: PositionId) -> OrgdeskResult<bool> {
        debug!("Deleting position: {}", id);
        POSITIONS.delete(self.pool.inner(), id.into_inner()).await
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        POSITIONS.count(self.pool.inner()).await
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        POSITIONS.count_active(self.pool.inner()).await
    }

    async fn count_users(&self, id: PositionId) -> OrgdeskResult<u64> {
        POSITIONS.count_users(self.pool.inner(), id.into_inner()).await
    }

    async fn user_counts(&self) -> OrgdeskResult<Vec<GroupCount>> {
        POSITIONS.user_counts(self.pool.inner()).await
    }
}
