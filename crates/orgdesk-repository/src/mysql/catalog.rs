//! SQL shared by the division and position tables, which have the same
//! code/name/active shape under different column prefixes.

use super::{inserted_id, map_unique, order_by, to_count};
use chrono::{DateTime, Utc};
use orgdesk_core::{GroupCount, ListQuery, NewCatalogEntry, OrgdeskResult, Page, SortColumn};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

/// Table and column names of one catalog table.
pub(crate) struct CatalogTable {
    pub table: &'static str,
    /// Column prefix, e.g. `div` for `div_code`.
    pub prefix: &'static str,
    /// Column of `login_users` referencing this table.
    pub user_fk: &'static str,
    pub unique_index: &'static str,
}

pub(crate) const DIVISIONS: CatalogTable = CatalogTable {
    table: "login_divisions",
    prefix: "div",
    user_fk: "u_division_id",
    unique_index: "uq_divisions_code",
};

pub(crate) const POSITIONS: CatalogTable = CatalogTable {
    table: "login_positions",
    prefix: "pos",
    user_fk: "u_position_id",
    unique_index: "uq_positions_code",
};

#[derive(Debug, FromRow)]
pub(crate) struct CatalogRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogTable {
    fn select(&self) -> String {
        let p = self.prefix;
        format!(
            "SELECT {p}_id AS id, {p}_code AS code, {p}_name AS name, {p}_is_active AS is_active, \
             {p}_created_by AS created_by, {p}_updated_by AS updated_by, \
             {p}_created_at AS created_at, {p}_updated_at AS updated_at FROM {}",
            self.table
        )
    }

    fn code_field(&self) -> String {
        format!("{}_code", self.prefix)
    }

    pub async fn find_by_id(&self, pool: &MySqlPool, id: i64) -> OrgdeskResult<Option<CatalogRow>> {
        let sql = format!("{} WHERE {}_id = ?", self.select(), self.prefix);
        let row = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_ids(&self, pool: &MySqlPool, ids: &[i64]) -> OrgdeskResult<Vec<CatalogRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<MySql>::new(format!("{} WHERE {}_id IN (", self.select(), self.prefix));
        let mut list = builder.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        let rows = builder.build_query_as::<CatalogRow>().fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn exists_by_code(&self, pool: &MySqlPool, code: &str, except: Option<i64>) -> OrgdeskResult<bool> {
        let p = self.prefix;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {p}_code = ? AND (? IS NULL OR {p}_id <> ?)",
            self.table
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(code)
            .bind(except)
            .bind(except)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn find_all<S: SortColumn>(
        &self,
        pool: &MySqlPool,
        query: &ListQuery<S>,
    ) -> OrgdeskResult<Page<CatalogRow>> {
        let total = self.count_where(pool, "").await?;

        let sql = format!("{} ORDER BY {} LIMIT ? OFFSET ?", self.select(), order_by(query.sort));
        let rows = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page::new(rows, query.page, total))
    }

    pub async fn find_active(&self, pool: &MySqlPool) -> OrgdeskResult<Vec<CatalogRow>> {
        let p = self.prefix;
        let sql = format!("{} WHERE {p}_is_active = 1 ORDER BY {p}_id", self.select());
        let rows = sqlx::query_as::<_, CatalogRow>(&sql).fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn insert(&self, pool: &MySqlPool, entry: &NewCatalogEntry) -> OrgdeskResult<CatalogRow> {
        let p = self.prefix;
        let sql = format!(
            "INSERT INTO {} ({p}_code, {p}_name, {p}_is_active, {p}_created_by, {p}_updated_by) \
             VALUES (?, ?, ?, ?, ?)",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(&entry.code)
            .bind(&entry.name)
            .bind(entry.is_active)
            .bind(&entry.created_by)
            .bind(&entry.created_by)
            .execute(pool)
            .await
            .map_err(|e| map_unique(e, &[(self.unique_index, self.code_field().as_str())]))?;

        self.fetch(pool, inserted_id(&result)?).await
    }

    pub async fn update(
        &self,
        pool: &MySqlPool,
        id: i64,
        code: &str,
        name: &str,
        is_active: bool,
        updated_by: Option<&str>,
    ) -> OrgdeskResult<CatalogRow> {
        let p = self.prefix;
        let sql = format!(
            "UPDATE {} SET {p}_code = ?, {p}_name = ?, {p}_is_active = ?, {p}_updated_by = ?, \
             {p}_updated_at = CURRENT_TIMESTAMP WHERE {p}_id = ?",
            self.table
        );
        sqlx::query(&sql)
            .bind(code)
            .bind(name)
            .bind(is_active)
            .bind(updated_by)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_unique(e, &[(self.unique_index, self.code_field().as_str())]))?;

        self.fetch(pool, id).await
    }

    pub async fn delete(&self, pool: &MySqlPool, id: i64) -> OrgdeskResult<bool> {
        let sql = format!("DELETE FROM {} WHERE {}_id = ?", self.table, self.prefix);
        let result = sqlx::query(&sql).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self, pool: &MySqlPool) -> OrgdeskResult<u64> {
        self.count_where(pool, "").await
    }

    pub async fn count_active(&self, pool: &MySqlPool) -> OrgdeskResult<u64> {
        self.count_where(pool, &format!(" WHERE {}_is_active = 1", self.prefix)).await
    }

    pub async fn count_users(&self, pool: &MySqlPool, id: i64) -> OrgdeskResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM login_users WHERE {} = ?", self.user_fk);
        let count = sqlx::query_scalar::<_, i64>(&sql).bind(id).fetch_one(pool).await?;
        Ok(to_count(count))
    }

    pub async fn user_counts(&self, pool: &MySqlPool) -> OrgdeskResult<Vec<GroupCount>> {
        let p = self.prefix;
        let sql = format!(
            "SELECT c.{p}_name, COUNT(u.u_id) FROM {} c \
             LEFT JOIN login_users u ON u.{} = c.{p}_id \
             GROUP BY c.{p}_id, c.{p}_name ORDER BY c.{p}_id",
            self.table, self.user_fk
        );
        let rows = sqlx::query_as::<_, (String, i64)>(&sql).fetch_all(pool).await?;
        Ok(rows
            .into_iter()
            .map(|(name, count)| GroupCount {
                name,
                count: to_count(count),
            })
            .collect())
    }

    async fn fetch(&self, pool: &MySqlPool, id: i64) -> OrgdeskResult<CatalogRow> {
        let sql = format!("{} WHERE {}_id = ?", self.select(), self.prefix);
        let row = sqlx::query_as::<_, CatalogRow>(&sql).bind(id).fetch_one(pool).await?;
        Ok(row)
    }

    async fn count_where(&self, pool: &MySqlPool, filter: &str) -> OrgdeskResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}{filter}", self.table);
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await?;
        Ok(to_count(count))
    }
}
