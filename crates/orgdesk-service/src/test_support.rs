//! Fixtures for service tests.

use crate::{
    AuthServiceComponent, DashboardServiceComponent, LocalImageStore, Repositories, ResourceHandlers,
};
use chrono::NaiveDate;
use orgdesk_core::{
    Actor, DivisionId, NewCatalogEntry, NewRole, NewUser, PagingPolicy, Payload, PositionId, Role, RoleId, User,
};
use orgdesk_repository::memory::InMemoryDatabase;
use orgdesk_repository::{DivisionRepository, PositionRepository, RoleRepository, UserRepository};
use orgdesk_security::{PasswordHasher, PasswordHasherInterface, TokenService};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "secret-password";

pub struct Fixture {
    pub db: Arc<InMemoryDatabase>,
    pub repos: Repositories,
    pub hasher: Arc<PasswordHasher>,
    pub handlers: ResourceHandlers,
    public_root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let repos = Repositories::shared(&db);
        let hasher = Arc::new(PasswordHasher::with_cost(1));
        let public_root = tempfile::tempdir().unwrap();
        let handlers = ResourceHandlers::build(
            &repos,
            Arc::clone(&hasher) as Arc<dyn PasswordHasherInterface>,
            Arc::new(LocalImageStore::new(public_root.path())),
            PagingPolicy::default(),
        );
        Self {
            db,
            repos,
            hasher,
            handlers,
            public_root,
        }
    }

    pub fn public_root(&self) -> &Path {
        self.public_root.path()
    }

    pub fn auth(&self) -> AuthServiceComponent {
        AuthServiceComponent::new(
            &self.repos,
            Arc::clone(&self.hasher) as Arc<dyn PasswordHasherInterface>,
            Arc::new(TokenService::default()),
        )
    }

    pub fn auth_with_tokens(&self, tokens: TokenService) -> AuthServiceComponent {
        AuthServiceComponent::new(
            &self.repos,
            Arc::clone(&self.hasher) as Arc<dyn PasswordHasherInterface>,
            Arc::new(tokens),
        )
    }

    pub fn dashboard(&self) -> DashboardServiceComponent {
        DashboardServiceComponent::new(&self.repos)
    }

    pub async fn user(&self, employee_id: &str, email: &str, active: bool) -> User {
        let new = NewUser {
            employee_id: employee_id.to_string(),
            name: format!("User {employee_id}"),
            email: email.to_string(),
            password_hash: self.hasher.hash(PASSWORD).unwrap(),
            phone: None,
            address: None,
            birthdate: None,
            join_date: date("2024-01-15"),
            profile_image: None,
            division_id: None,
            position_id: None,
            is_manager: false,
            manager_id: None,
            is_active: active,
            created_by: Actor::System.audit_value(),
        };
        UserRepository::insert(self.db.as_ref(), &new, &[]).await.unwrap()
    }

    pub async fn role(&self, name: &str, active: bool) -> Role {
        let new = NewRole {
            name: name.to_string(),
            level: 1,
            is_active: active,
            created_by: Actor::System.audit_value(),
        };
        RoleRepository::insert(self.db.as_ref(), &new).await.unwrap()
    }

    pub async fn division(&self, code: &str, active: bool) -> DivisionId {
        DivisionRepository::insert(self.db.as_ref(), &catalog_entry(code, active))
            .await
            .unwrap()
            .id
    }

    pub async fn position(&self, code: &str, active: bool) -> PositionId {
        PositionRepository::insert(self.db.as_ref(), &catalog_entry(code, active))
            .await
            .unwrap()
            .id
    }

    /// Replaces a user's roles directly in storage.
    pub async fn grant(&self, user: &User, roles: &[RoleId]) {
        UserRepository::update(self.db.as_ref(), user, Some(roles)).await.unwrap();
    }
}

fn catalog_entry(code: &str, active: bool) -> NewCatalogEntry {
    NewCatalogEntry {
        code: code.to_string(),
        name: format!("{code} name"),
        is_active: active,
        created_by: Actor::System.audit_value(),
    }
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn payload(body: Value) -> Payload {
    Payload::from_json(body)
}
