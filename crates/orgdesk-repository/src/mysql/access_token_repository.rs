//! MySQL access token repository implementation.

use super::inserted_id;
use crate::{traits::AccessTokenRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orgdesk_core::{AccessToken, AccessTokenId, NewAccessToken, OrgdeskResult, UserId};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const TOKEN_COLUMNS: &str = "at_id, at_user_id, at_name, at_token, at_last_used_at, at_expires_at, at_created_at";

/// MySQL access token repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = AccessTokenRepository)]
pub struct MySqlAccessTokenRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlAccessTokenRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for MySqlAccessTokenRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAccessTokenRepository").finish_non_exhaustive()
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    at_id: AccessTokenId,
    at_user_id: UserId,
    at_name: String,
    at_token: String,
    at_last_used_at: Option<DateTime<Utc>>,
    at_expires_at: Option<DateTime<Utc>>,
    at_created_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for AccessToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.at_id,
            user_id: row.at_user_id,
            name: row.at_name,
            token_hash: row.at_token,
            last_used_at: row.at_last_used_at,
            expires_at: row.at_expires_at,
            created_at: row.at_created_at,
        }
    }
}

#[async_trait]
impl AccessTokenRepository for MySqlAccessTokenRepository {
    async fn insert(&self, token: &NewAccessToken) -> OrgdeskResult<AccessToken> {
        debug!("Issuing access token for user: {}", token.user_id);

        let result = sqlx::query(
            "INSERT INTO login_access_tokens (at_user_id, at_name, at_token, at_expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token.user_id)
        .bind(&token.name)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .execute(self.pool.inner())
        .await?;

        let id = AccessTokenId(inserted_id(&result)?);
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM login_access_tokens WHERE at_id = ?");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(id)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: AccessTokenId) -> OrgdeskResult<Option<AccessToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM login_access_tokens WHERE at_id = ?");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(AccessToken::from))
    }

    async fn find_by_hash(&self, token_hash: &str) -> OrgdeskResult<Option<AccessToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM login_access_tokens WHERE at_token = ?");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token_hash)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(AccessToken::from))
    }

    async fn touch(&self, id: AccessTokenId, at: DateTime<Utc>) -> OrgdeskResult<()> {
        sqlx::query("UPDATE login_access_tokens SET at_last_used_at = ? WHERE at_id = ?")
            .bind(at)
            .bind(id)
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }

    async fn delete(&self, id: AccessTokenId) -> OrgdeskResult<bool> {
        debug!("Revoking access token: {}", id);

        let result = sqlx::query("DELETE FROM login_access_tokens WHERE at_id = ?")
            .bind(id)
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: UserId) -> OrgdeskResult<u64> {
        let result = sqlx::query("DELETE FROM login_access_tokens WHERE at_user_id = ?")
            .bind(user_id)
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected())
    }
}
