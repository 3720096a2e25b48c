//! Dashboard aggregation.

use crate::dto::DashboardStatistics;
use crate::repositories::Repositories;
use crate::resources::RelationLoader;
use async_trait::async_trait;
use orgdesk_core::{Interface, OrgdeskResult};
use orgdesk_repository::{DivisionRepository, PositionRepository, RoleRepository, UserRepository};
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// How many of the newest users the dashboard shows.
pub const RECENT_USERS: u32 = 5;

/// Dashboard service trait.
#[async_trait]
pub trait DashboardService: Interface + Send + Sync {
    /// Computes every counter afresh.
    async fn statistics(&self) -> OrgdeskResult<DashboardStatistics>;
}

/// Dashboard service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = DashboardService)]
pub struct DashboardServiceComponent {
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    #[shaku(inject)]
    roles: Arc<dyn RoleRepository>,
    #[shaku(inject)]
    divisions: Arc<dyn DivisionRepository>,
    #[shaku(inject)]
    positions: Arc<dyn PositionRepository>,
}

impl DashboardServiceComponent {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: Arc::clone(&repos.users),
            roles: Arc::clone(&repos.roles),
            divisions: Arc::clone(&repos.divisions),
            positions: Arc::clone(&repos.positions),
        }
    }
}

#[async_trait]
impl DashboardService for DashboardServiceComponent {
    async fn statistics(&self) -> OrgdeskResult<DashboardStatistics> {
        debug!("Computing dashboard statistics");

        let total_users = self.users.count().await?;
        let active_users = self.users.count_active().await?;
        let recent = self.users.find_recent(RECENT_USERS).await?;
        let relations = RelationLoader::new(
            Arc::clone(&self.users),
            Arc::clone(&self.roles),
            Arc::clone(&self.divisions),
            Arc::clone(&self.positions),
        );

        Ok(DashboardStatistics {
            total_users,
            active_users,
            inactive_users: total_users.saturating_sub(active_users),
            total_divisions: self.divisions.count().await?,
            active_divisions: self.divisions.count_active().await?,
            total_positions: self.positions.count().await?,
            active_positions: self.positions.count_active().await?,
            total_roles: self.roles.count().await?,
            active_roles: self.roles.count_active().await?,
            managers_count: self.users.count_managers().await?,
            users_by_division: self.divisions.user_counts().await?,
            users_by_position: self.positions.user_counts().await?,
            recent_users: relations.recent(recent).await?,
        })
    }
}

impl std::fmt::Debug for DashboardServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn test_statistics_counts() {
        let fx = Fixture::new();
        let eng = fx.division("ENG", true).await;
        fx.division("OPS", false).await;
        fx.position("DEV", true).await;
        fx.role("Admin", true).await;
        fx.role("Legacy", false).await;

        let mut ada = fx.user("E001", "ada@example.com", true).await;
        ada.division_id = Some(eng);
        ada.is_manager = true;
        fx.grant(&ada, &[]).await;
        fx.user("E002", "bob@example.com", false).await;
        fx.user("E003", "cy@example.com", true).await;

        let stats = fx.dashboard().statistics().await.unwrap();

        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.inactive_users, 1);
        assert_eq!((stats.total_divisions, stats.active_divisions), (2, 1));
        assert_eq!((stats.total_positions, stats.active_positions), (1, 1));
        assert_eq!((stats.total_roles, stats.active_roles), (2, 1));
        assert_eq!(stats.managers_count, 1);

        let eng_count = stats.users_by_division.iter().find(|g| g.name == "ENG name").unwrap();
        assert_eq!(eng_count.count, 1);
        assert!(stats.users_by_division.iter().any(|g| g.name == "OPS name" && g.count == 0));
    }

    #[tokio::test]
    async fn test_recent_users_limited_to_five() {
        let fx = Fixture::new();
        for n in 1..=7 {
            fx.user(&format!("E{n:03}"), &format!("u{n}@example.com"), true).await;
        }

        let stats = fx.dashboard().statistics().await.unwrap();
        assert_eq!(stats.recent_users.len(), RECENT_USERS as usize);
        assert_eq!(stats.recent_users[0].user.employee_id, "E007");
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let stats = Fixture::new().dashboard().statistics().await.unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.inactive_users, 0);
        assert!(stats.recent_users.is_empty());
        assert!(stats.users_by_position.is_empty());
    }
}
