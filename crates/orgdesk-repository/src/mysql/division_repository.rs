//! MySQL division repository implementation.

use super::catalog::{CatalogRow, DIVISIONS};
use crate::{traits::DivisionRepository, DatabasePoolInterface};
use async_trait::async_trait;
use orgdesk_core::{
    Division, DivisionId, DivisionSort, GroupCount, ListQuery, NewCatalogEntry, OrgdeskResult, Page,
};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// MySQL division repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = DivisionRepository)]
pub struct MySqlDivisionRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlDivisionRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for MySqlDivisionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDivisionRepository").finish_non_exhaustive()
    }
}

impl From<CatalogRow> for Division {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: DivisionId(row.id),
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
impl DivisionRepository for MySqlDivisionRepository {
    async fn find_by_id(&self, id: DivisionId) -> OrgdeskResult<Option<Division>> {
        debug!("Finding division by id: {}", id);
        Ok(DIVISIONS
            .find_by_id(self.pool.inner(), id.into_inner())
            .await?
            .map(Division::from))
    }

    async fn find_by_ids(&self, ids: &[DivisionId]) -> OrgdeskResult<Vec<Division>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = DIVISIONS.find_by_ids(self.pool.inner(), &raw).await?;
        Ok(rows.into_iter().map(Division::from).collect())
    }

    async fn exists_by_code(&self, code: &str, except: Option<DivisionId>) -> OrgdeskResult<bool> {
        DIVISIONS
            .exists_by_code(self.pool.inner(), code, except.map(DivisionId::into_inner))
            .await
    }

    async fn find_all(&self, query: &ListQuery<DivisionSort>) -> OrgdeskResult<Page<Division>> {
        debug!("Listing divisions: {:?}", query);
        Ok(DIVISIONS
            .find_all(self.pool.inner(), query)
            .await?
            .map(Division::from))
    }

    async fn find_active(&self) -> OrgdeskResult<Vec<Division>> {
        let rows = DIVISIONS.find_active(self.pool.inner()).await?;
        Ok(rows.into_iter().map(Division::from).collect())
    }

    async fn insert(&self, division: &NewCatalogEntry) -> OrgdeskResult<Division> {
        debug!("Inserting division: {}", division.code);
        Ok(DIVISIONS.insert(self.pool.inner(), division).await?.into())
    }

    async fn update(&self, division: &Division) -> OrgdeskResult<Division> {
        debug!("Updating division: {}", division.id);
        let row = DIVISIONS
            .update(
                self.pool.inner(),
                division.id.into_inner(),
                &division.code,
                &division.name,
                division.is_active,
                division.updated_by.as_deref(),
            )
            .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: DivisionId) -> OrgdeskResult<bool> {
        debug!("Deleting division: {}", id);
        DIVISIONS.delete(self.pool.inner(), id.into_inner()).await
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        DIVISIONS.count(self.pool.inner()).await
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        DIVISIONS.count_active(self.pool.inner()).await
    }

    async fn count_users(&self, id: DivisionId) -> OrgdeskResult<u64> {
        DIVISIONS.count_users(self.pool.inner(), id.into_inner()).await
    }

    async fn user_counts(&self) -> OrgdeskResult<Vec<GroupCount>> {
        DIVISIONS.user_counts(self.pool.inner()).await
    }
}
