//! Authentication service: login, token resolution and logout.

use crate::dto::{LoginResponse, UserView};
use crate::forms::{parse_form, LoginForm};
use crate::repositories::Repositories;
use crate::resources::RelationLoader;
use async_trait::async_trait;
use chrono::Utc;
use orgdesk_core::{
    AccessToken, AccessTokenId, Interface, NewAccessToken, NoLookup, OrgdeskError, OrgdeskResult, Payload, User,
};
use orgdesk_repository::{
    AccessTokenRepository, DivisionRepository, PositionRepository, RoleRepository, UserRepository,
};
use orgdesk_security::{digest_secret, parse_token, PasswordHasherInterface, TokenServiceInterface};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name recorded on tokens issued by login.
pub const LOGIN_TOKEN_NAME: &str = "auth_token";

/// A request authenticated by a bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    /// The presented token, revoked by logout.
    pub token_id: AccessTokenId,
}

/// Authentication service trait.
#[async_trait]
pub trait AuthService: Interface + Send + Sync {
    /// Checks credentials and issues a new bearer token.
    async fn login(&self, payload: Payload) -> OrgdeskResult<LoginResponse>;

    /// Resolves a bearer token to its user.
    async fn authenticate(&self, bearer: &str) -> OrgdeskResult<Authenticated>;

    /// Returns the user with division, position and roles.
    async fn me(&self, user: User) -> OrgdeskResult<UserView>;

    /// Revokes the given token.
    async fn logout(&self, token_id: AccessTokenId) -> OrgdeskResult<()>;
}

/// Authentication service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = AuthService)]
pub struct AuthServiceComponent {
    #[shaku(inject)]
    users: Arc<dyn UserRepository>,
    #[shaku(inject)]
    roles: Arc<dyn RoleRepository>,
    #[shaku(inject)]
    divisions: Arc<dyn DivisionRepository>,
    #[shaku(inject)]
    positions: Arc<dyn PositionRepository>,
    #[shaku(inject)]
    tokens: Arc<dyn AccessTokenRepository>,
    #[shaku(inject)]
    password_hasher: Arc<dyn PasswordHasherInterface>,
    #[shaku(inject)]
    token_service: Arc<dyn TokenServiceInterface>,
}

impl AuthServiceComponent {
    pub fn new(
        repos: &Repositories,
        password_hasher: Arc<dyn PasswordHasherInterface>,
        token_service: Arc<dyn TokenServiceInterface>,
    ) -> Self {
        Self {
            users: Arc::clone(&repos.users),
            roles: Arc::clone(&repos.roles),
            divisions: Arc::clone(&repos.divisions),
            positions: Arc::clone(&repos.positions),
            tokens: Arc::clone(&repos.tokens),
            password_hasher,
            token_service,
        }
    }

    fn relations(&self) -> RelationLoader {
        RelationLoader::new(
            Arc::clone(&self.users),
            Arc::clone(&self.roles),
            Arc::clone(&self.divisions),
            Arc::clone(&self.positions),
        )
    }

    async fn find_token(&self, bearer: &str) -> OrgdeskResult<Option<AccessToken>> {
        let Some(parsed) = parse_token(bearer) else {
            return Ok(None);
        };
        match parsed.id {
            Some(id) => Ok(self
                .tokens
                .find_by_id(id)
                .await?
                .filter(|token| self.token_service.matches(parsed.secret, &token.token_hash))),
            None => self.tokens.find_by_hash(&digest_secret(parsed.secret)).await,
        }
    }
}

#[async_trait]
impl AuthService for AuthServiceComponent {
    async fn login(&self, payload: Payload) -> OrgdeskResult<LoginResponse> {
        let form: LoginForm = parse_form(payload, None, &NoLookup).await?;
        let email = form.email.require("email")?.to_lowercase();
        let password = form.password.require("password")?;
        debug!("Login attempt for: {}", email);

        // Every rejection pays for one hash verification.
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => user,
            Some(_) => {
                self.password_hasher.verify_dummy(&password)?;
                warn!("Login failed: user inactive - {}", email);
                return Err(OrgdeskError::InvalidCredentials);
            }
            None => {
                self.password_hasher.verify_dummy(&password)?;
                warn!("Login failed: user not found - {}", email);
                return Err(OrgdeskError::InvalidCredentials);
            }
        };

        if !self.password_hasher.verify(&password, &user.password_hash)? {
            warn!("Login failed: invalid password - {}", email);
            return Err(OrgdeskError::InvalidCredentials);
        }

        let secret = self.token_service.generate();
        let token = self
            .tokens
            .insert(&NewAccessToken {
                user_id: user.id,
                name: LOGIN_TOKEN_NAME.to_string(),
                token_hash: secret.digest,
                expires_at: self.token_service.expires_at(Utc::now()),
            })
            .await?;

        let view = self.relations().view(user).await?;
        let roles = view.roles.iter().map(|r| r.name.clone()).collect();

        info!("User logged in: {}", view.user.id);
        Ok(LoginResponse {
            token: self.token_service.plain_text(token.id, &secret.secret),
            user: view,
            roles,
            token_type: LoginResponse::TOKEN_TYPE,
        })
    }

    async fn authenticate(&self, bearer: &str) -> OrgdeskResult<Authenticated> {
        let token = self
            .find_token(bearer)
            .await?
            .ok_or_else(OrgdeskError::unauthenticated)?;

        let now = Utc::now();
        if token.is_expired(now) {
            debug!("Rejected expired token: {}", token.id);
            return Err(OrgdeskError::unauthenticated());
        }

        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or_else(OrgdeskError::unauthenticated)?;

        self.tokens.touch(token.id, now).await?;
        Ok(Authenticated {
            user,
            token_id: token.id,
        })
    }

    async fn me(&self, user: User) -> OrgdeskResult<UserView> {
        self.relations().view(user).await
    }

    async fn logout(&self, token_id: AccessTokenId) -> OrgdeskResult<()> {
        self.tokens.delete(token_id).await?;
        info!("Token revoked: {}", token_id);
        Ok(())
    }
}

impl std::fmt::Debug for AuthServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{payload, Fixture, PASSWORD};
    use orgdesk_security::{PasswordHasher, TokenService};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts verifications, real or dummy.
    struct CountingHasher {
        inner: PasswordHasher,
        verified: AtomicUsize,
    }

    impl PasswordHasherInterface for CountingHasher {
        fn hash(&self, password: &str) -> OrgdeskResult<String> {
            self.inner.hash(password)
        }

        fn verify(&self, password: &str, hash: &str) -> OrgdeskResult<bool> {
            self.verified.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, hash)
        }

        fn verify_dummy(&self, password: &str) -> OrgdeskResult<()> {
            self.verified.fetch_add(1, Ordering::SeqCst);
            self.inner.verify_dummy(password)
        }
    }

    fn credentials(email: &str, password: &str) -> Payload {
        payload(json!({ "email": email, "password": password }))
    }

    #[tokio::test]
    async fn test_login_issues_token_with_roles() {
        let fx = Fixture::new();
        let user = fx.user("E001", "ada@example.com", true).await;
        let admin = fx.role("Admin", true).await;
        fx.grant(&user, &[admin.id]).await;
        let auth = fx.auth();

        let response = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.roles, vec!["Admin".to_string()]);
        assert_eq!(response.user.user.id, user.id);
        let (id, secret) = response.token.split_once('|').unwrap();
        assert!(id.parse::<i64>().is_ok());
        assert_eq!(secret.len(), 40);

        let stored = fx.repos.tokens.find_by_id(id.parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.name, LOGIN_TOKEN_NAME);
        assert_ne!(stored.token_hash, secret);
    }

    #[tokio::test]
    async fn test_login_email_is_case_insensitive() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;

        let response = fx.auth().login(credentials("Ada@Example.COM", PASSWORD)).await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_login_rejections_are_indistinguishable() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        fx.user("E002", "bob@example.com", false).await;
        let auth = fx.auth();

        for (email, password) in [
            ("ada@example.com", "wrong-password"),
            ("bob@example.com", PASSWORD),
            ("nobody@example.com", PASSWORD),
        ] {
            let err = auth.login(credentials(email, password)).await.unwrap_err();
            assert!(matches!(err, OrgdeskError::InvalidCredentials), "{email}");
            assert_eq!(err.to_string(), "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_every_rejected_login_verifies_a_hash() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        fx.user("E002", "bob@example.com", false).await;
        let hasher = Arc::new(CountingHasher {
            inner: PasswordHasher::with_cost(1),
            verified: AtomicUsize::new(0),
        });
        let auth = AuthServiceComponent::new(
            &fx.repos,
            Arc::clone(&hasher) as Arc<dyn PasswordHasherInterface>,
            Arc::new(TokenService::default()),
        );

        for (email, password) in [
            ("ada@example.com", "wrong-password"),
            ("bob@example.com", PASSWORD),
            ("nobody@example.com", PASSWORD),
        ] {
            let before = hasher.verified.load(Ordering::SeqCst);
            assert!(auth.login(credentials(email, password)).await.is_err());
            assert_eq!(hasher.verified.load(Ordering::SeqCst), before + 1, "{email}");
        }
    }

    #[tokio::test]
    async fn test_login_validates_payload() {
        let fx = Fixture::new();
        let err = fx.auth().login(payload(json!({ "email": "not-an-email" }))).await.unwrap_err();

        let errors = err.field_errors().unwrap();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
    }

    #[tokio::test]
    async fn test_authenticate_and_logout() {
        let fx = Fixture::new();
        let user = fx.user("E001", "ada@example.com", true).await;
        let auth = fx.auth();
        let token = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;

        let current = auth.authenticate(&token).await.unwrap();
        assert_eq!(current.user.id, user.id);
        let stored = fx.repos.tokens.find_by_id(current.token_id).await.unwrap().unwrap();
        assert!(stored.last_used_at.is_some());

        auth.logout(current.token_id).await.unwrap();
        let err = auth.authenticate(&token).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_logout_only_revokes_presented_token() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        let auth = fx.auth();
        let first = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;
        let second = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;

        let current = auth.authenticate(&first).await.unwrap();
        auth.logout(current.token_id).await.unwrap();

        assert!(auth.authenticate(&first).await.is_err());
        assert!(auth.authenticate(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_accepts_bare_secret() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        let auth = fx.auth();
        let token = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;
        let (_, secret) = token.split_once('|').unwrap();

        assert!(auth.authenticate(secret).await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_tokens() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        let auth = fx.auth();
        let token = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;
        let (id, _) = token.split_once('|').unwrap();

        for bearer in ["", "garbage", "abc|def", &format!("{id}|not-the-secret")] {
            let err = auth.authenticate(bearer).await.unwrap_err();
            assert_eq!(err.to_string(), "Unauthenticated.", "{bearer}");
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let fx = Fixture::new();
        fx.user("E001", "ada@example.com", true).await;
        let auth = fx.auth_with_tokens(TokenService::new(40, Some(chrono::Duration::seconds(-1))));
        let token = auth.login(credentials("ada@example.com", PASSWORD)).await.unwrap().token;

        assert!(auth.authenticate(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_me_loads_relations() {
        let fx = Fixture::new();
        let mut user = fx.user("E001", "ada@example.com", true).await;
        user.division_id = Some(fx.division("ENG", true).await);
        let staff = fx.role("Staff", true).await;
        fx.grant(&user, &[staff.id]).await;

        let view = fx.auth().me(user).await.unwrap();
        assert_eq!(view.division.unwrap().code, "ENG");
        assert_eq!(view.roles.len(), 1);
        assert!(view.position.is_none());
    }
}
