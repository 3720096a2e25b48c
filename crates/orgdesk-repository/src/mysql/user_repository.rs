//! MySQL user repository implementation.

use super::{inserted_id, like_pattern, map_unique, order_by, to_count};
use crate::{traits::UserRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use orgdesk_core::{
    DivisionId, ListQuery, NewUser, OrgdeskError, OrgdeskResult, Page, PositionId, RoleId, User, UserId, UserSort,
};
use shaku::Component;
use sqlx::{FromRow, MySql, QueryBuilder, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const USER_COLUMNS: &str = "u_id, u_employee_id, u_name, u_email, u_password, u_phone, u_address, \
     u_birthdate, u_join_date, u_profile_image, u_division_id, u_position_id, u_is_manager, \
     u_manager_id, u_is_active, u_created_by, u_updated_by, u_created_at, u_updated_at";

const SEARCH_FILTER: &str =
    " WHERE LOWER(u_name) LIKE ? OR LOWER(u_email) LIKE ? OR LOWER(u_employee_id) LIKE ?";

const UNIQUE_KEYS: &[(&str, &str)] = &[
    ("uq_users_email", "u_email"),
    ("uq_users_employee_id", "u_employee_id"),
];

/// MySQL user repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = UserRepository)]
pub struct MySqlUserRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlUserRepository {
    /// Creates a new MySQL user repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, MySql>,
        id: UserId,
    ) -> OrgdeskResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM login_users WHERE u_id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(row.into())
    }

    async fn attach_roles(
        tx: &mut Transaction<'_, MySql>,
        user: UserId,
        roles: &[RoleId],
        created_by: Option<&str>,
    ) -> OrgdeskResult<()> {
        if roles.is_empty() {
            return Ok(());
        }
        let mut builder =
            QueryBuilder::<MySql>::new("INSERT INTO login_user_roles (ur_user_id, ur_role_id, ur_created_by) ");
        builder.push_values(roles, |mut row, role| {
            row.push_bind(user).push_bind(*role).push_bind(created_by);
        });
        builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn sync_roles(
        tx: &mut Transaction<'_, MySql>,
        user: UserId,
        roles: &[RoleId],
        created_by: Option<&str>,
    ) -> OrgdeskResult<()> {
        let current: HashSet<RoleId> =
            sqlx::query_scalar::<_, RoleId>("SELECT ur_role_id FROM login_user_roles WHERE ur_user_id = ?")
                .bind(user)
                .fetch_all(&mut **tx)
                .await?
                .into_iter()
                .collect();
        let wanted: HashSet<RoleId> = roles.iter().copied().collect();

        let removed: Vec<RoleId> = current.difference(&wanted).copied().collect();
        if !removed.is_empty() {
            let mut builder =
                QueryBuilder::<MySql>::new("DELETE FROM login_user_roles WHERE ur_user_id = ");
            builder.push_bind(user).push(" AND ur_role_id IN (");
            let mut ids = builder.separated(", ");
            for role in &removed {
                ids.push_bind(*role);
            }
            ids.push_unseparated(")");
            builder.build().execute(&mut **tx).await?;
        }

        let added: Vec<RoleId> = roles.iter().copied().filter(|r| !current.contains(r)).collect();
        Self::attach_roles(tx, user, &added, created_by).await
    }

    async fn find_where(&self, filter: &str, id: i64) -> OrgdeskResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM login_users WHERE {filter} ORDER BY u_id");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count_where(&self, filter: &str) -> OrgdeskResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM login_users{filter}");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(to_count(count))
    }
}

impl std::fmt::Debug for MySqlUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlUserRepository").finish_non_exhaustive()
    }
}

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    u_id: UserId,
    u_employee_id: String,
    u_name: String,
    u_email: String,
    u_password: String,
    u_phone: Option<String>,
    u_address: Option<String>,
    u_birthdate: Option<NaiveDate>,
    u_join_date: NaiveDate,
    u_profile_image: Option<String>,
    u_division_id: Option<DivisionId>,
    u_position_id: Option<PositionId>,
    u_is_manager: bool,
    u_manager_id: Option<UserId>,
    u_is_active: bool,
    u_created_by: Option<String>,
    u_updated_by: Option<String>,
    u_created_at: Option<DateTime<Utc>>,
    u_updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.u_id,
            employee_id: row.u_employee_id,
            name: row.u_name,
            email: row.u_email,
            password_hash: row.u_password,
            phone: row.u_phone,
            address: row.u_address,
            birthdate: row.u_birthdate,
            join_date: row.u_join_date,
            profile_image: row.u_profile_image,
            division_id: row.u_division_id,
            position_id: row.u_position_id,
            is_manager: row.u_is_manager,
            manager_id: row.u_manager_id,
            is_active: row.u_is_active,
            created_by: row.u_created_by,
            updated_by: row.u_updated_by,
            created_at: row.u_created_at,
            updated_at: row.u_updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: UserId) -> OrgdeskResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let sql = format!("SELECT {USER_COLUMNS} FROM login_users WHERE u_id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> OrgdeskResult<Option<User>> {
        debug!("Finding user by email: {}", email);

        let sql = format!("SELECT {USER_COLUMNS} FROM login_users WHERE u_email = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> OrgdeskResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Finding {} users by id", ids.len());

        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {USER_COLUMNS} FROM login_users WHERE u_id IN ("));
        let mut list = builder.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn exists_by_email(&self, email: &str, except: Option<UserId>) -> OrgdeskResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM login_users WHERE u_email = ? AND (? IS NULL OR u_id <> ?)",
        )
        .bind(email.to_lowercase())
        .bind(except)
        .bind(except)
        .fetch_one(self.pool.inner())
        .await?;
        Ok(count > 0)
    }

    async fn exists_by_employee_id(&self, employee_id: &str, except: Option<UserId>) -> OrgdeskResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM login_users WHERE u_employee_id = ? AND (? IS NULL OR u_id <> ?)",
        )
        .bind(employee_id)
        .bind(except)
        .bind(except)
        .fetch_one(self.pool.inner())
        .await?;
        Ok(count > 0)
    }

    async fn find_all(&self, query: &ListQuery<UserSort>) -> OrgdeskResult<Page<User>> {
        debug!("Listing users: {:?}", query);

        let pattern = query.search.as_deref().map(like_pattern);
        let filter = if pattern.is_some() { SEARCH_FILTER } else { "" };

        let count_sql = format!("SELECT COUNT(*) FROM login_users{filter}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern).bind(pattern).bind(pattern);
        }
        let total = count_query.fetch_one(self.pool.inner()).await?;

        let list_sql = format!(
            "SELECT {USER_COLUMNS} FROM login_users{filter} ORDER BY {} LIMIT ? OFFSET ?",
            order_by(query.sort)
        );
        let mut list_query = sqlx::query_as::<_, UserRow>(&list_sql);
        if let Some(pattern) = &pattern {
            list_query = list_query.bind(pattern).bind(pattern).bind(pattern);
        }
        let rows = list_query
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(self.pool.inner())
            .await?;

        let users = rows.into_iter().map(User::from).collect();
        Ok(Page::new(users, query.page, to_count(total)))
    }

    async fn find_by_division(&self, id: DivisionId) -> OrgdeskResult<Vec<User>> {
        self.find_where("u_division_id = ?", id.into_inner()).await
    }

    async fn find_by_position(&self, id: PositionId) -> OrgdeskResult<Vec<User>> {
        self.find_where("u_position_id = ?", id.into_inner()).await
    }

    async fn find_by_role(&self, id: RoleId) -> OrgdeskResult<Vec<User>> {
        self.find_where(
            "u_id IN (SELECT ur_user_id FROM login_user_roles WHERE ur_role_id = ?)",
            id.into_inner(),
        )
        .await
    }

    async fn find_recent(&self, limit: u32) -> OrgdeskResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM login_users ORDER BY u_created_at DESC, u_id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool.inner())
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn role_links(&self, users: &[UserId]) -> OrgdeskResult<Vec<(UserId, RoleId)>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(
            "SELECT ur_user_id, ur_role_id FROM login_user_roles WHERE ur_user_id IN (",
        );
        let mut list = builder.separated(", ");
        for id in users {
            list.push_bind(*id);
        }
        list.push_unseparated(") ORDER BY ur_user_id, ur_role_id");

        let links = builder
            .build_query_as::<(UserId, RoleId)>()
            .fetch_all(self.pool.inner())
            .await?;
        Ok(links)
    }

    async fn insert(&self, user: &NewUser, roles: &[RoleId]) -> OrgdeskResult<User> {
        debug!("Inserting user: {}", user.employee_id);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r"
            INSERT INTO login_users (
                u_employee_id, u_name, u_email, u_password, u_phone, u_address,
                u_birthdate, u_join_date, u_profile_image, u_division_id, u_position_id,
                u_is_manager, u_manager_id, u_is_active, u_created_by, u_updated_by
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&user.employee_id)
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.birthdate)
        .bind(user.join_date)
        .bind(&user.profile_image)
        .bind(user.division_id)
        .bind(user.position_id)
        .bind(user.is_manager)
        .bind(user.manager_id)
        .bind(user.is_active)
        .bind(&user.created_by)
        .bind(&user.created_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, UNIQUE_KEYS))?;

        let id = UserId(inserted_id(&result)?);
        Self::attach_roles(&mut tx, id, roles, Some(&user.created_by)).await?;
        let created = Self::fetch_in(&mut tx, id).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn update(&self, user: &User, roles: Option<&[RoleId]>) -> OrgdeskResult<User> {
        debug!("Updating user: {}", user.id);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r"
            UPDATE login_users SET
                u_employee_id = ?, u_name = ?, u_email = ?, u_password = ?, u_phone = ?,
                u_address = ?, u_birthdate = ?, u_join_date = ?, u_profile_image = ?,
                u_division_id = ?, u_position_id = ?, u_is_manager = ?, u_manager_id = ?,
                u_is_active = ?, u_updated_by = ?, u_updated_at = CURRENT_TIMESTAMP
            WHERE u_id = ?
            ",
        )
        .bind(&user.employee_id)
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.birthdate)
        .bind(user.join_date)
        .bind(&user.profile_image)
        .bind(user.division_id)
        .bind(user.position_id)
        .bind(user.is_manager)
        .bind(user.manager_id)
        .bind(user.is_active)
        .bind(&user.updated_by)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, UNIQUE_KEYS))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM login_users WHERE u_id = ?")
                .bind(user.id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(OrgdeskError::not_found("User"));
            }
        }

        if let Some(roles) = roles {
            Self::sync_roles(&mut tx, user.id, roles, user.updated_by.as_deref()).await?;
        }
        let updated = Self::fetch_in(&mut tx, user.id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> OrgdeskResult<bool> {
        debug!("Deleting user: {}", id);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM login_user_roles WHERE ur_user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        // A user may be their own manager; drop that link so the FK allows the delete.
        sqlx::query("UPDATE login_users SET u_manager_id = NULL WHERE u_id = ? AND u_manager_id = u_id")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM login_users WHERE u_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        self.count_where("").await
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        self.count_where(" WHERE u_is_active = 1").await
    }

    async fn count_managers(&self) -> OrgdeskResult<u64> {
        self.count_where(" WHERE u_is_manager = 1").await
    }

    async fn count_subordinates(&self, id: UserId) -> OrgdeskResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM login_users WHERE u_manager_id = ? AND u_id <> ?")
            .bind(id)
            .bind(id)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(to_count(count))
    }
}
