//! Response shapes with their related records loaded.

use orgdesk_core::{Division, GroupCount, Position, Role, User};
use serde::Serialize;

/// A user with division, position and roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub division: Option<Division>,
    pub position: Option<Position>,
    pub roles: Vec<Role>,
}

/// A user with every relation, including the manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub view: UserView,
    pub manager: Option<User>,
}

/// A role with the users holding it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub users: Vec<User>,
}

/// A user with its position, as listed under a division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithPosition {
    #[serde(flatten)]
    pub user: User,
    pub position: Option<Position>,
}

/// A user with its division, as listed under a position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithDivision {
    #[serde(flatten)]
    pub user: User,
    pub division: Option<Division>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionDetail {
    #[serde(flatten)]
    pub division: Division,
    pub users: Vec<UserWithPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDetail {
    #[serde(flatten)]
    pub position: Position,
    pub users: Vec<UserWithDivision>,
}

/// A user with division and position, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentUser {
    #[serde(flatten)]
    pub user: User,
    pub division: Option<Division>,
    pub position: Option<Position>,
}

/// Dashboard counters and breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStatistics {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    pub total_divisions: u64,
    pub active_divisions: u64,
    pub total_positions: u64,
    pub active_positions: u64,
    pub total_roles: u64,
    pub active_roles: u64,
    pub managers_count: u64,
    pub users_by_division: Vec<GroupCount>,
    pub users_by_position: Vec<GroupCount>,
    pub recent_users: Vec<RecentUser>,
}

/// Result of a successful login.
#[derive(Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    /// Names of the user's roles.
    pub roles: Vec<String>,
    pub token: String,
    pub token_type: &'static str,
}

impl LoginResponse {
    pub const TOKEN_TYPE: &'static str = "Bearer";
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user.user.id)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}
