//! Auth gateway: every account flow in one place.
//!
//! The gateway composes the user directory, the password hasher, the token
//! codec, the user cache, the reset ledger and the email sender. It holds no
//! mutable state of its own and is shared across request tasks behind an `Arc`.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::authorization::{require_admin, require_admin_or_self};
use crate::auth::hashing::PasswordHasher;
use crate::auth::jwt::TokenCodec;
use crate::auth::models::Role;
use crate::auth::reset_ledger::ResetLedger;
use crate::auth::user::{
    LoginForm, NewUser, ResetPasswordRequest, SignupRequest, TokenResponse, User, UserId,
};
use crate::auth::user_cache::UserCache;
use crate::config::{AppConfig, EmailConfig};
use crate::errors::{AuthErrorType, ContactbookError, Result};
use crate::observability::metrics;
use crate::services::email::EmailSender;
use crate::storage::kv::SharedStore;
use crate::storage::{DbPool, SqlxUserRepository, UserRepository};

/// One page of the user directory
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
}

#[derive(Clone)]
pub struct AuthGateway {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    cache: UserCache,
    ledger: ResetLedger,
    mailer: Arc<dyn EmailSender>,
    email: EmailConfig,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("hasher", &self.hasher)
            .field("codec", &self.codec)
            .field("cache", &self.cache)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        codec: TokenCodec,
        cache: UserCache,
        ledger: ResetLedger,
        mailer: Arc<dyn EmailSender>,
        email: EmailConfig,
    ) -> Self {
        Self { users, hasher, codec, cache, ledger, mailer, email }
    }

    /// Wire the gateway from configuration over a SQL pool and a shared store
    pub fn from_config(
        config: &AppConfig,
        pool: DbPool,
        store: SharedStore,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self::new(
            Arc::new(SqlxUserRepository::new(pool)),
            PasswordHasher::new(config.auth.bcrypt_cost),
            TokenCodec::new(config.auth.jwt_secret.as_bytes(), config.auth.token_expiry()),
            UserCache::new(store.clone(), config.cache.user_ttl()),
            ResetLedger::new(store, config.auth.reset_token_ttl()),
            mailer,
            config.email.clone(),
        )
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cache(&self) -> &UserCache {
        &self.cache
    }

    pub fn ledger(&self) -> &ResetLedger {
        &self.ledger
    }

    /// Register a new, unverified account and send its verification link.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email, username or password
    /// - `Conflict` when the email is already registered
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<User> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            warn!("Signup attempt for existing email");
            return Err(email_taken());
        }

        let password_hash = self.hasher.hash_blocking(&request.password).await?;

        let user = self
            .users
            .create(NewUser { email: request.email, username: request.username, password_hash })
            .await
            .map_err(|err| if err.is_unique_violation() { email_taken() } else { err })?;

        let token = self.codec.issue(&user.email, None)?;
        let link = self.email.verification_link(&token);
        if let Err(err) = self.mailer.send_verification(&user.email, &link).await {
            warn!(user_id = user.id, error = %err, "Failed to send verification email");
        }

        metrics::record_signup().await;
        info!(user_id = user.id, "User signed up");
        Ok(user)
    }

    /// Mark the account named by a verification token as verified
    #[instrument(skip(self, token))]
    pub async fn verify_email(&self, token: &str) -> Result<User> {
        let claims = self.codec.verify(token)?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ContactbookError::not_found("user", claims.sub.clone()))?;

        if user.is_verified {
            return Ok(user);
        }

        let user = self.users.mark_verified(user.id).await?;
        let _ = self.cache.invalidate(&user.email).await;

        info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Exchange email and password for a bearer token.
    ///
    /// Unknown accounts and wrong passwords fail identically, and unknown
    /// accounts still pay for one bcrypt verification.
    #[instrument(skip(self, form), fields(email = %form.username))]
    pub async fn login(&self, form: LoginForm) -> Result<TokenResponse> {
        let Some(user) = self.users.find_by_email(&form.username).await? else {
            self.hasher.verify_dummy_blocking(&form.password).await;
            warn!("Login attempt for unknown account");
            metrics::record_authentication("invalid_credentials").await;
            return Err(ContactbookError::auth(AuthErrorType::InvalidCredentials));
        };

        if !self.hasher.verify_blocking(&form.password, &user.password_hash).await {
            warn!(user_id = user.id, "Login attempt with incorrect password");
            metrics::record_authentication("invalid_credentials").await;
            return Err(ContactbookError::auth(AuthErrorType::InvalidCredentials));
        }

        let token = self.codec.issue(&user.email, None)?;

        metrics::record_authentication("success").await;
        info!(user_id = user.id, "User logged in");
        Ok(TokenResponse::bearer(token))
    }

    /// Resolve a bearer token to its account, reading through the cache
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let claims = self.codec.verify(token)?;

        if let Some(cached) = self.cache.get(&claims.sub).await.flatten() {
            return Ok(cached.into());
        }

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ContactbookError::not_found("user", claims.sub.clone()))?;

        let _ = self.cache.put(&user).await;
        Ok(user)
    }

    /// Issue and mail a reset token when the account exists.
    ///
    /// Returns `Ok` whether or not the email is registered.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Some(user) = self.users.find_by_email(email).await? else {
            metrics::record_password_reset("unknown_email").await;
            return Ok(());
        };

        let token = self.ledger.create_token(&user.email).await?;
        let link = self.email.reset_link(&token);
        if let Err(err) = self.mailer.send_password_reset(&user.email, &link).await {
            warn!(user_id = user.id, error = %err, "Failed to send password reset email");
        }

        metrics::record_password_reset("requested").await;
        info!(user_id = user.id, "Password reset requested");
        Ok(())
    }

    /// Redeem a reset token and set a new password.
    ///
    /// The new password is hashed before the token is touched, so a rejected
    /// password leaves the token usable.
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate()?;

        let password_hash = self.hasher.hash_blocking(&request.new_password).await?;

        let Some(email) = self.ledger.redeem(&request.token).await else {
            metrics::record_password_reset("invalid_token").await;
            return Err(ContactbookError::auth(AuthErrorType::InvalidResetToken));
        };

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ContactbookError::not_found("user", email.clone()))?;

        self.users.update_password(user.id, &password_hash).await?;
        let _ = self.cache.invalidate(&user.email).await;

        metrics::record_password_reset("completed").await;
        info!(user_id = user.id, "Password reset completed");
        Ok(())
    }

    /// Page through the directory. Admin only.
    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn list_users(&self, actor: &User, limit: i64, offset: i64) -> Result<UserPage> {
        require_admin(actor)?;

        let users = self.users.list(limit, offset).await?;
        let total = self.users.count().await?;
        Ok(UserPage { users, total })
    }

    /// Fetch one account. Admins see anyone, users see themselves.
    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn get_user(&self, actor: &User, target: UserId) -> Result<User> {
        require_admin_or_self(actor, target)?;

        self.users
            .find_by_id(target)
            .await?
            .ok_or_else(|| ContactbookError::not_found("user", target.to_string()))
    }

    /// Change an account's role. Admin only; the check runs before any lookup.
    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    pub async fn update_role(&self, actor: &User, target: UserId, role: &str) -> Result<User> {
        require_admin(actor)?;

        let role = role
            .parse::<Role>()
            .map_err(|err| ContactbookError::validation_field(err.to_string(), "role"))?;

        let user = self.users.update_role(target, role).await?;
        let _ = self.cache.invalidate(&user.email).await;

        info!(target_id = user.id, role = %role, "User role updated");
        Ok(user)
    }

    /// Point the caller's avatar at an uploaded file
    #[instrument(skip(self, actor, avatar_url), fields(actor_id = actor.id))]
    pub async fn update_avatar(&self, actor: &User, avatar_url: &str) -> Result<User> {
        let user = self.users.update_avatar(actor.id, avatar_url).await?;
        let _ = self.cache.invalidate(&user.email).await;
        Ok(user)
    }
}

fn email_taken() -> ContactbookError {
    ContactbookError::conflict("Email already registered", "user")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::test_support::RecordingEmailSender;
    use crate::storage::kv::test_support::FailingStore;
    use crate::storage::kv::InMemoryStore;
    use crate::storage::test_helpers::memory_pool;
    use std::time::Duration;

    const SECRET: &str = "gateway-test-secret-that-is-long-enough";

    struct Harness {
        gateway: AuthGateway,
        mailer: Arc<RecordingEmailSender>,
        users: Arc<SqlxUserRepository>,
    }

    async fn harness_with(store: SharedStore, mailer: RecordingEmailSender) -> Harness {
        let users = Arc::new(SqlxUserRepository::new(memory_pool().await));
        let mailer = Arc::new(mailer);
        let gateway = AuthGateway::new(
            users.clone(),
            PasswordHasher::new(4),
            TokenCodec::new(SECRET.as_bytes(), Duration::from_secs(3600)),
            UserCache::new(store.clone(), Duration::from_secs(3600)),
            ResetLedger::new(store, Duration::from_secs(3600)),
            mailer.clone(),
            EmailConfig::default(),
        );
        Harness { gateway, mailer, users }
    }

    async fn harness() -> Harness {
        harness_with(Arc::new(InMemoryStore::new()), RecordingEmailSender::default()).await
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            username: "alice".to_string(),
            password: "secret1".to_string(),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm { username: email.to_string(), password: password.to_string() }
    }

    fn token_from_link(link: &str) -> String {
        link.split("token=").nth(1).unwrap().to_string()
    }

    #[tokio::test]
    async fn signup_then_login_then_current_user() {
        let h = harness().await;
        let user = h.gateway.signup(signup_request("a@example.com")).await.unwrap();
        assert!(!user.is_verified);
        assert_ne!(user.password_hash, "secret1");

        let token = h.gateway.login(login_form("a@example.com", "secret1")).await.unwrap();
        assert_eq!(token.token_type, "bearer");

        let me = h.gateway.current_user(&token.access_token).await.unwrap();
        assert_eq!(me.email, "a@example.com");

        // second resolution comes from the cache
        assert!(h.gateway.cache().get("a@example.com").await.flatten().is_some());
        let again = h.gateway.current_user(&token.access_token).await.unwrap();
        assert_eq!(again.id, me.id);
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let h = harness().await;
        h.gateway.signup(signup_request("dup@example.com")).await.unwrap();

        let err = h.gateway.signup(signup_request("dup@example.com")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    /// Directory whose email lookups always miss, as when a concurrent signup
    /// commits between the existence check and the insert
    struct StaleLookup(SqlxUserRepository);

    #[async_trait::async_trait]
    impl UserRepository for StaleLookup {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
            Ok(None)
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
            self.0.find_by_id(id).await
        }

        async fn create(&self, user: NewUser) -> Result<User> {
            self.0.create(user).await
        }

        async fn update_password(&self, id: UserId, password_hash: &str) -> Result<User> {
            self.0.update_password(id, password_hash).await
        }

        async fn update_role(&self, id: UserId, role: Role) -> Result<User> {
            self.0.update_role(id, role).await
        }

        async fn update_avatar(&self, id: UserId, avatar_url: &str) -> Result<User> {
            self.0.update_avatar(id, avatar_url).await
        }

        async fn mark_verified(&self, id: UserId) -> Result<User> {
            self.0.mark_verified(id).await
        }

        async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
            self.0.list(limit, offset).await
        }

        async fn count(&self) -> Result<i64> {
            self.0.count().await
        }
    }

    #[tokio::test]
    async fn signup_maps_unique_violation_on_insert_to_conflict() {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(RecordingEmailSender::default());
        let gateway = AuthGateway::new(
            Arc::new(StaleLookup(SqlxUserRepository::new(memory_pool().await))),
            PasswordHasher::new(4),
            TokenCodec::new(SECRET.as_bytes(), Duration::from_secs(3600)),
            UserCache::new(store.clone(), Duration::from_secs(3600)),
            ResetLedger::new(store, Duration::from_secs(3600)),
            mailer.clone(),
            EmailConfig::default(),
        );

        gateway.signup(signup_request("race@example.com")).await.unwrap();
        let err = gateway.signup(signup_request("race@example.com")).await.unwrap_err();

        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("Email already registered"));
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let h = harness().await;
        let mut request = signup_request("not-an-email");
        assert_eq!(h.gateway.signup(request.clone()).await.unwrap_err().status_code(), 400);

        request.email = "ok@example.com".to_string();
        request.password = "x".repeat(73);
        assert_eq!(h.gateway.signup(request).await.unwrap_err().status_code(), 400);
        assert!(h.users.find_by_email("ok@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signup_survives_email_failure() {
        let h = harness_with(Arc::new(InMemoryStore::new()), RecordingEmailSender::failing()).await;
        let user = h.gateway.signup(signup_request("a@example.com")).await.unwrap();
        assert!(h.users.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn verify_email_flow() {
        let h = harness().await;
        h.gateway.signup(signup_request("v@example.com")).await.unwrap();

        let sent = h.mailer.sent();
        assert_eq!(sent[0].kind, "verification");
        let token = token_from_link(&sent[0].link);

        let verified = h.gateway.verify_email(&token).await.unwrap();
        assert!(verified.is_verified);

        // idempotent
        assert!(h.gateway.verify_email(&token).await.unwrap().is_verified);
    }

    #[tokio::test]
    async fn verify_email_rejects_bad_token_and_unknown_subject() {
        let h = harness().await;
        let err = h.gateway.verify_email("garbage").await.unwrap_err();
        assert_eq!(err.status_code(), 401);

        let orphan = h.gateway.codec().issue("ghost@example.com", None).unwrap();
        let err = h.gateway.verify_email(&orphan).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness().await;
        h.gateway.signup(signup_request("a@example.com")).await.unwrap();

        let wrong = h.gateway.login(login_form("a@example.com", "nope!!")).await.unwrap_err();
        let unknown = h.gateway.login(login_form("b@example.com", "secret1")).await.unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(
            wrong,
            ContactbookError::Auth { error_type: AuthErrorType::InvalidCredentials, .. }
        ));
    }

    #[tokio::test]
    async fn current_user_for_deleted_subject_is_not_found() {
        let h = harness().await;
        let token = h.gateway.codec().issue("nobody@example.com", None).unwrap();
        assert_eq!(h.gateway.current_user(&token).await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn current_user_works_without_cache_backend() {
        let h = harness_with(Arc::new(FailingStore), RecordingEmailSender::default()).await;
        h.gateway.signup(signup_request("a@example.com")).await.unwrap();
        let token = h.gateway.login(login_form("a@example.com", "secret1")).await.unwrap();

        let me = h.gateway.current_user(&token.access_token).await.unwrap();
        assert_eq!(me.email, "a@example.com");
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let h = harness().await;
        h.gateway.signup(signup_request("r@example.com")).await.unwrap();
        h.gateway.request_password_reset("r@example.com").await.unwrap();

        let sent = h.mailer.sent();
        let reset = sent.iter().find(|m| m.kind == "password_reset").unwrap();
        assert!(reset.link.contains("/auth/reset-password?token="));
        let token = token_from_link(&reset.link);

        h.gateway
            .reset_password(ResetPasswordRequest { token: token.clone(), new_password: "newpass1".into() })
            .await
            .unwrap();

        assert!(h.gateway.login(login_form("r@example.com", "secret1")).await.is_err());
        assert!(h.gateway.login(login_form("r@example.com", "newpass1")).await.is_ok());

        // single use
        let err = h
            .gateway
            .reset_password(ResetPasswordRequest { token, new_password: "another1".into() })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_writes_nothing() {
        let h = harness().await;
        h.gateway.request_password_reset("ghost@example.com").await.unwrap();
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn reset_request_fails_when_ledger_is_down() {
        let h = harness_with(Arc::new(FailingStore), RecordingEmailSender::default()).await;
        h.gateway.signup(signup_request("a@example.com")).await.unwrap();

        let err = h.gateway.request_password_reset("a@example.com").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn overlong_password_keeps_reset_token_alive() {
        let h = harness().await;
        h.gateway.signup(signup_request("r@example.com")).await.unwrap();
        let token = h.gateway.ledger().create_token("r@example.com").await.unwrap();

        let err = h
            .gateway
            .reset_password(ResetPasswordRequest { token: token.clone(), new_password: "x".repeat(80) })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(h.gateway.ledger().resolve(&token).await.as_deref(), Some("r@example.com"));
    }

    #[tokio::test]
    async fn garbage_reset_token_is_rejected() {
        let h = harness().await;
        let err = h
            .gateway
            .reset_password(ResetPasswordRequest { token: "garbage".into(), new_password: "newpass1".into() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ContactbookError::Auth { error_type: AuthErrorType::InvalidResetToken, .. }
        ));
    }

    #[tokio::test]
    async fn role_update_requires_admin_before_lookup() {
        let h = harness().await;
        let user = h.gateway.signup(signup_request("u@example.com")).await.unwrap();

        for target in [user.id, 999] {
            let err = h.gateway.update_role(&user, target, "admin").await.unwrap_err();
            assert_eq!(err.status_code(), 403);
        }
    }

    #[tokio::test]
    async fn role_update_invalidates_cache() {
        let h = harness().await;
        let user = h.gateway.signup(signup_request("u@example.com")).await.unwrap();
        let admin = h.users.update_role(user.id, Role::Admin).await.unwrap();
        let target = h.gateway.signup(signup_request("t@example.com")).await.unwrap();

        let token = h.gateway.login(login_form("t@example.com", "secret1")).await.unwrap();
        assert_eq!(h.gateway.current_user(&token.access_token).await.unwrap().role, Role::User);

        h.gateway.update_role(&admin, target.id, "admin").await.unwrap();
        assert_eq!(h.gateway.current_user(&token.access_token).await.unwrap().role, Role::Admin);

        let err = h.gateway.update_role(&admin, target.id, "superuser").await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = h.gateway.update_role(&admin, 999, "user").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn list_and_get_users_enforce_roles() {
        let h = harness().await;
        let user = h.gateway.signup(signup_request("u@example.com")).await.unwrap();
        let other = h.gateway.signup(signup_request("o@example.com")).await.unwrap();

        assert_eq!(h.gateway.list_users(&user, 10, 0).await.unwrap_err().status_code(), 403);
        assert_eq!(h.gateway.get_user(&user, user.id).await.unwrap().id, user.id);
        assert_eq!(h.gateway.get_user(&user, other.id).await.unwrap_err().status_code(), 403);

        let admin = h.users.update_role(user.id, Role::Admin).await.unwrap();
        let page = h.gateway.list_users(&admin, 1, 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, other.id);
        assert_eq!(h.gateway.get_user(&admin, 999).await.unwrap_err().status_code(), 404);
    }

    #[tokio::test]
    async fn avatar_update_refreshes_cached_user() {
        let h = harness().await;
        let user = h.gateway.signup(signup_request("a@example.com")).await.unwrap();
        let token = h.gateway.login(login_form("a@example.com", "secret1")).await.unwrap();
        h.gateway.current_user(&token.access_token).await.unwrap();

        h.gateway.update_avatar(&user, "http://localhost/media/avatars/x.png").await.unwrap();

        let me = h.gateway.current_user(&token.access_token).await.unwrap();
        assert_eq!(me.avatar_url.as_deref(), Some("http://localhost/media/avatars/x.png"));
    }
}
