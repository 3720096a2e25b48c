//! Repository trait definitions.
//!
//! Multi-table writes (a user together with its role links) are single
//! repository calls so that implementations can make them atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orgdesk_core::{
    AccessToken, AccessTokenId, Division, DivisionId, DivisionSort, GroupCount, Interface, ListQuery,
    NewAccessToken, NewCatalogEntry, NewRole, NewUser, OrgdeskResult, Page, Position, PositionId,
    PositionSort, Role, RoleId, RoleSort, RoleSummary, User, UserId, UserSort,
};

/// Repository trait for user persistence operations.
#[async_trait]
pub trait UserRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: UserId) -> OrgdeskResult<Option<User>>;

    /// Finds a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> OrgdeskResult<Option<User>>;

    /// Loads several users at once; missing ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> OrgdeskResult<Vec<User>>;

    /// Checks whether another user holds the email (case-insensitive).
    async fn exists_by_email(&self, email: &str, except: Option<UserId>) -> OrgdeskResult<bool>;

    async fn exists_by_employee_id(&self, employee_id: &str, except: Option<UserId>) -> OrgdeskResult<bool>;

    /// Lists users; the search term matches name, email and employee id.
    async fn find_all(&self, query: &ListQuery<UserSort>) -> OrgdeskResult<Page<User>>;

    async fn find_by_division(&self, id: DivisionId) -> OrgdeskResult<Vec<User>>;

    async fn find_by_position(&self, id: PositionId) -> OrgdeskResult<Vec<User>>;

    async fn find_by_role(&self, id: RoleId) -> OrgdeskResult<Vec<User>>;

    /// Returns the most recently created users, newest first.
    async fn find_recent(&self, limit: u32) -> OrgdeskResult<Vec<User>>;

    /// Returns the `(user, role)` links of the given users.
    async fn role_links(&self, users: &[UserId]) -> OrgdeskResult<Vec<(UserId, RoleId)>>;

    /// Inserts a user and attaches `roles` atomically.
    async fn insert(&self, user: &NewUser, roles: &[RoleId]) -> OrgdeskResult<User>;

    /// Writes every column of `user` and, when `roles` is given, replaces the
    /// user's role links, atomically.
    async fn update(&self, user: &User, roles: Option<&[RoleId]>) -> OrgdeskResult<User>;

    /// Detaches all roles and deletes the user atomically.
    async fn delete(&self, id: UserId) -> OrgdeskResult<bool>;

    async fn count(&self) -> OrgdeskResult<u64>;

    async fn count_active(&self) -> OrgdeskResult<u64>;

    async fn count_managers(&self) -> OrgdeskResult<u64>;

    /// Counts users other than `id` itself whose manager is `id`.
    async fn count_subordinates(&self, id: UserId) -> OrgdeskResult<u64>;
}

/// Repository trait for role persistence operations.
#[async_trait]
pub trait RoleRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: RoleId) -> OrgdeskResult<Option<Role>>;

    async fn find_by_ids(&self, ids: &[RoleId]) -> OrgdeskResult<Vec<Role>>;

    async fn exists_by_name(&self, name: &str, except: Option<RoleId>) -> OrgdeskResult<bool>;

    /// Lists roles together with their user counts.
    async fn find_all(&self, query: &ListQuery<RoleSort>) -> OrgdeskResult<Page<RoleSummary>>;

    async fn find_active(&self) -> OrgdeskResult<Vec<Role>>;

    async fn insert(&self, role: &NewRole) -> OrgdeskResult<Role>;

    async fn update(&self, role: &Role) -> OrgdeskResult<Role>;

    async fn delete(&self, id: RoleId) -> OrgdeskResult<bool>;

    async fn count(&self) -> OrgdeskResult<u64>;

    async fn count_active(&self) -> OrgdeskResult<u64>;

    /// Counts users holding the role.
    async fn count_users(&self, id: RoleId) -> OrgdeskResult<u64>;
}

/// Repository trait for division persistence operations.
#[async_trait]
pub trait DivisionRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: DivisionId) -> OrgdeskResult<Option<Division>>;

    async fn find_by_ids(&self, ids: &[DivisionId]) -> OrgdeskResult<Vec<Division>>;

    async fn exists_by_code(&self, code: &str, except: Option<DivisionId>) -> OrgdeskResult<bool>;

    async fn find_all(&self, query: &ListQuery<DivisionSort>) -> OrgdeskResult<Page<Division>>;

    async fn find_active(&self) -> OrgdeskResult<Vec<Division>>;

    async fn insert(&self, division: &NewCatalogEntry) -> OrgdeskResult<Division>;

    async fn update(&self, division: &Division) -> OrgdeskResult<Division>;

    async fn delete(&self, id: DivisionId) -> OrgdeskResult<bool>;

    async fn count(&self) -> OrgdeskResult<u64>;

    async fn count_active(&self) -> OrgdeskResult<u64>;

    /// Counts users assigned to the division.
    async fn count_users(&self, id: DivisionId) -> OrgdeskResult<u64>;

    /// Returns the number of users per division, including empty ones.
    async fn user_counts(&self) -> OrgdeskResult<Vec<GroupCount>>;
}

/// Repository trait for position persistence operations.
#[async_trait]
pub trait PositionRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: PositionId) -> OrgdeskResult<Option<Position>>;

    async fn find_by_ids(&self, ids: &[PositionId]) -> OrgdeskResult<Vec<Position>>;

    async fn exists_by_code(&self, code: &str, except: Option<PositionId>) -> OrgdeskResult<bool>;

    async fn find_all(&self, query: &ListQuery<PositionSort>) -> OrgdeskResult<Page<Position>>;

    async fn find_active(&self) -> OrgdeskResult<Vec<Position>>;

    async fn insert(&self, position: &NewCatalogEntry) -> OrgdeskResult<Position>;

    async fn update(&self, position: &Position) -> OrgdeskResult<Position>;

    async fn delete(&self, id: PositionId) -> OrgdeskResult<bool>;

    async fn count(&self) -> OrgdeskResult<u64>;

    async fn count_active(&self) -> OrgdeskResult<u64>;

    /// Counts users holding the position.
    async fn count_users(&self, id: PositionId) -> OrgdeskResult<u64>;

    /// Returns the number of users per position, including empty ones.
    async fn user_counts(&self) -> OrgdeskResult<Vec<GroupCount>>;
}

/// Repository trait for bearer token storage.
#[async_trait]
pub trait AccessTokenRepository: Interface + Send + Sync {
    async fn insert(&self, token: &NewAccessToken) -> OrgdeskResult<AccessToken>;

    async fn find_by_id(&self, id: AccessTokenId) -> OrgdeskResult<Option<AccessToken>>;

    async fn find_by_hash(&self, token_hash: &str) -> OrgdeskResult<Option<AccessToken>>;

    /// Records that the token was just used.
    async fn touch(&self, id: AccessTokenId, at: DateTime<Utc>) -> OrgdeskResult<()>;

    async fn delete(&self, id: AccessTokenId) -> OrgdeskResult<bool>;

    /// Deletes every token of a user, returning how many were removed.
    async fn delete_for_user(&self, user_id: UserId) -> OrgdeskResult<u64>;
}
