//! MySQL role repository implementation.

use super::{inserted_id, map_unique, order_by, to_count};
use crate::{traits::RoleRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orgdesk_core::{ListQuery, NewRole, OrgdeskResult, Page, Role, RoleId, RoleSort, RoleSummary};
use shaku::Component;
use sqlx::{FromRow, MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

const ROLE_COLUMNS: &str = "role_id, role_name, role_level, role_is_active, role_created_by, \
     role_updated_by, role_created_at, role_updated_at";

const UNIQUE_KEYS: &[(&str, &str)] = &[("uq_roles_name", "role_name")];

/// MySQL role repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = RoleRepository)]
pub struct MySqlRoleRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlRoleRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: RoleId) -> OrgdeskResult<Role> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM login_roles WHERE role_id = ?");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(row.into())
    }

    async fn count_where(&self, filter: &str) -> OrgdeskResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM login_roles{filter}");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(to_count(count))
    }
}

impl std::fmt::Debug for MySqlRoleRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlRoleRepository").finish_non_exhaustive()
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: RoleId,
    role_name: String,
    role_level: i32,
    role_is_active: bool,
    role_created_by: Option<String>,
    role_updated_by: Option<String>,
    role_created_at: Option<DateTime<Utc>>,
    role_updated_at: Option<DateTime<Utc>>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.role_id,
            name: row.role_name,
            level: row.role_level,
            is_active: row.role_is_active,
            created_by: row.role_created_by,
            updated_by: row.role_updated_by,
            created_at: row.role_created_at,
            updated_at: row.role_updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleSummaryRow {
    #[sqlx(flatten)]
    role: RoleRow,
    users_count: i64,
}

#[async_trait]
impl RoleRepository for MySqlRoleRepository {
    async fn find_by_id(&self, id: RoleId) -> OrgdeskResult<Option<Role>> {
        debug!("Finding role by id: {}", id);

        let sql = format!("SELECT {ROLE_COLUMNS} FROM login_roles WHERE role_id = ?");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(Role::from))
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> OrgdeskResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {ROLE_COLUMNS} FROM login_roles WHERE role_id IN ("));
        let mut list = builder.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(") ORDER BY role_id");

        let rows = builder
            .build_query_as::<RoleRow>()
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn exists_by_name(&self, name: &str, except: Option<RoleId>) -> OrgdeskResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM login_roles WHERE role_name = ? AND (? IS NULL OR role_id <> ?)",
        )
        .bind(name)
        .bind(except)
        .bind(except)
        .fetch_one(self.pool.inner())
        .await?;
        Ok(count > 0)
    }

    async fn find_all(&self, query: &ListQuery<RoleSort>) -> OrgdeskResult<Page<RoleSummary>> {
        debug!("Listing roles: {:?}", query);

        let total = self.count_where("").await?;
        let sql = format!(
            "SELECT {ROLE_COLUMNS}, \
             (SELECT COUNT(*) FROM login_user_roles ur WHERE ur.ur_role_id = login_roles.role_id) AS users_count \
             FROM login_roles ORDER BY {} LIMIT ? OFFSET ?",
            order_by(query.sort)
        );
        let rows = sqlx::query_as::<_, RoleSummaryRow>(&sql)
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(self.pool.inner())
            .await?;

        let roles = rows
            .into_iter()
            .map(|row| RoleSummary {
                role: row.role.into(),
                users_count: to_count(row.users_count),
            })
            .collect();
        Ok(Page::new(roles, query.page, total))
    }

    async fn find_active(&self) -> OrgdeskResult<Vec<Role>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM login_roles WHERE role_is_active = 1 ORDER BY role_id");
        let rows = sqlx::query_as::<_, RoleRow>(&sql)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn insert(&self, role: &NewRole) -> OrgdeskResult<Role> {
        debug!("Inserting role: {}", role.name);

        let result = sqlx::query(
            r"
            INSERT INTO login_roles (role_name, role_level, role_is_active, role_created_by, role_updated_by)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&role.name)
        .bind(role.level)
        .bind(role.is_active)
        .bind(&role.created_by)
        .bind(&role.created_by)
        .execute(self.pool.inner())
        .await
        .map_err(|e| map_unique(e, UNIQUE_KEYS))?;

        self.fetch(RoleId(inserted_id(&result)?)).await
    }

    async fn update(&self, role: &Role) -> OrgdeskResult<Role> {
        debug!("Updating role: {}", role.id);

        sqlx::query(
            r"
            UPDATE login_roles SET
                role_name = ?, role_level = ?, role_is_active = ?, role_updated_by = ?,
                role_updated_at = CURRENT_TIMESTAMP
            WHERE role_id = ?
            ",
        )
        .bind(&role.name)
        .bind(role.level)
        .bind(role.is_active)
        .bind(&role.updated_by)
        .bind(role.id)
        .execute(self.pool.inner())
        .await
        .map_err(|e| map_unique(e, UNIQUE_KEYS))?;

        self.fetch(role.id).await
    }

    async fn delete(&self, id: RoleId) -> OrgdeskResult<bool> {
        debug!("Deleting role: {}", id);

        let result = sqlx::query("DELETE FROM login_roles WHERE role_id = ?")
            .bind(id)
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        self.count_where("").await
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        self.count_where(" WHERE role_is_active = 1").await
    }

    async fn count_users(&self, id: RoleId) -> OrgdeskResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM login_user_roles WHERE ur_role_id = ?")
            .bind(id)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(to_count(count))
    }
}
