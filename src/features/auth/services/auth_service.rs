use std::sync::Arc;

use rand::Rng;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::clients::{OAuthClient, OAuthProvider};
use crate::features::auth::dtos::{
    ChangeEmailDto, ChangePasswordDto, LoginDto, PasswordResetDto, RegisterHandlerDto,
    RegisterUserDto,
};
use crate::features::auth::password::{hash_password, Credentials};
use crate::features::auth::principal::{Principal, PrincipalKind};
use crate::features::auth::services::AccountNotifier;
use crate::features::auth::session::SessionManager;
use crate::features::auth::tokens::{TokenPurpose, TokenSigner, TokenVerification};
use crate::features::roles::services::RoleService;
use crate::features::staff::models::{Handler, NewHandler};
use crate::features::staff::services::HandlerService;
use crate::features::users::models::{NewUser, User};
use crate::features::users::services::UserService;
use crate::shared::constants::{ROLE_ADMINISTRATOR, ROLE_HANDLER};

const INVALID_CREDENTIALS: &str = "You provided invalid credentials. Please try again.";
const INVALID_LINK: &str = "The link you used is either expired or corrupted";
const INVALID_CONFIRMATION: &str = "The confirmation link is invalid or has expired.";

/// Result of following a confirmation link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// Account lookup shared by both principal kinds
enum Account {
    User(User),
    Handler(Handler),
}

impl Account {
    fn id(&self) -> Uuid {
        match self {
            Account::User(u) => u.id,
            Account::Handler(h) => h.id,
        }
    }

    fn email(&self) -> &str {
        match self {
            Account::User(u) => &u.email,
            Account::Handler(h) => &h.email,
        }
    }

    fn display_name(&self) -> &str {
        match self {
            Account::User(u) => &u.username,
            Account::Handler(h) => &h.name,
        }
    }

    fn confirmed(&self) -> bool {
        match self {
            Account::User(u) => u.confirmed,
            Account::Handler(h) => h.confirmed,
        }
    }

    fn verify_password(&self, password: &str) -> bool {
        match self {
            Account::User(u) => u.verify_password(password),
            Account::Handler(h) => h.verify_password(password),
        }
    }

    /// Deactivated citizens cannot sign in
    fn can_login(&self) -> bool {
        match self {
            Account::User(u) => u.active,
            Account::Handler(_) => true,
        }
    }
}

/// Registration, login, confirmation and credential management for citizens and handlers
pub struct AuthService {
    users: Arc<UserService>,
    handlers: Arc<HandlerService>,
    roles: Arc<RoleService>,
    tokens: Arc<TokenSigner>,
    notifier: Arc<AccountNotifier>,
    sessions: Arc<SessionManager>,
    oauth: Arc<OAuthClient>,
    administrator_email: Option<String>,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UserService>,
        handlers: Arc<HandlerService>,
        roles: Arc<RoleService>,
        tokens: Arc<TokenSigner>,
        notifier: Arc<AccountNotifier>,
        sessions: Arc<SessionManager>,
        oauth: Arc<OAuthClient>,
        administrator_email: Option<String>,
    ) -> Self {
        Self {
            users,
            handlers,
            roles,
            tokens,
            notifier,
            sessions,
            oauth,
            administrator_email,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    fn is_administrator_email(&self, email: &str) -> bool {
        self.administrator_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }

    async fn find_account(&self, kind: PrincipalKind, email: &str) -> Result<Option<Account>> {
        Ok(match kind {
            PrincipalKind::User => self.users.find_by_email(email).await?.map(Account::User),
            PrincipalKind::Handler => self
                .handlers
                .find_by_email(email)
                .await?
                .map(Account::Handler),
        })
    }

    async fn get_account(&self, principal: &Principal) -> Result<(PrincipalKind, Account)> {
        match principal {
            Principal::User(u) => Ok((
                PrincipalKind::User,
                Account::User(self.users.get_by_id(u.id).await?),
            )),
            Principal::Handler(h) => Ok((
                PrincipalKind::Handler,
                Account::Handler(self.handlers.get_by_id(h.id).await?),
            )),
            Principal::Anonymous => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }

    /// Register a citizen account and send the confirmation e-mail
    pub async fn register_user(&self, dto: RegisterUserDto) -> Result<User> {
        let email = dto.email.trim().to_lowercase();

        let mut taken = Vec::new();
        if self.users.find_by_email(&email).await?.is_some() {
            taken.push(("email", "Email is already registered.".to_string()));
        }
        if self.users.username_exists(&dto.username).await? {
            taken.push(("username", "Username is already taken.".to_string()));
        }
        if !taken.is_empty() {
            return Err(AppError::fields(taken));
        }

        let role = if self.is_administrator_email(&email) {
            self.roles.get_by_title(ROLE_ADMINISTRATOR).await?
        } else {
            self.roles.get_default().await?
        };

        let user = self
            .users
            .create(NewUser {
                email,
                username: dto.username,
                phone_number: Some(dto.phone_number),
                password_hash: Some(hash_password(&dto.password)?),
                confirmed: false,
                role_id: role.id,
            })
            .await?;

        self.notifier
            .send_confirmation(PrincipalKind::User, &user.email, &user.username)?;

        Ok(user)
    }

    /// Register a handler account; it starts unapproved with the `Handler` role
    pub async fn register_handler(&self, dto: RegisterHandlerDto) -> Result<Handler> {
        let email = dto.email.trim().to_lowercase();

        if self.handlers.find_by_email(&email).await?.is_some() {
            return Err(AppError::field("email", "Email is already registered."));
        }

        let role = self.roles.get_by_title(ROLE_HANDLER).await?;

        let handler = self
            .handlers
            .create(NewHandler {
                name: dto.name.trim().to_string(),
                handler_type: dto.handler_type.trim().to_string(),
                resource_availability: dto.resource_availability,
                email,
                phone_number: Some(dto.phone_number),
                password_hash: hash_password(&dto.password)?,
                role_id: role.id,
            })
            .await?;

        self.notifier
            .send_confirmation(PrincipalKind::Handler, &handler.email, &handler.name)?;

        Ok(handler)
    }

    /// Check credentials and return the principal id to store in the session.
    ///
    /// Unknown e-mail, wrong password and deactivated accounts all get the same answer.
    pub async fn login(&self, kind: PrincipalKind, dto: &LoginDto) -> Result<Uuid> {
        let account = self
            .find_account(kind, &dto.email)
            .await?
            .filter(|account| account.can_login() && account.verify_password(&dto.password));

        match account {
            Some(account) => {
                tracing::info!("{} {} logged in", kind, account.id());
                Ok(account.id())
            }
            None => {
                tracing::debug!("Rejected {} login attempt", kind);
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    /// Confirm the account named by a confirmation token
    pub async fn confirm(&self, kind: PrincipalKind, token: &str) -> Result<ConfirmationOutcome> {
        let email = match self.tokens.verify(token, kind, TokenPurpose::Confirmation) {
            TokenVerification::Valid(email) => email,
            TokenVerification::Expired | TokenVerification::Malformed => {
                return Err(AppError::Unauthorized(INVALID_CONFIRMATION.to_string()));
            }
        };

        let account = self
            .find_account(kind, &email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CONFIRMATION.to_string()))?;

        if account.confirmed() {
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        match account {
            Account::User(u) => {
                let user = self.users.confirm(u.id).await?;
                tracing::info!("User {} confirmed", user.id);
            }
            Account::Handler(h) => {
                let handler = self.handlers.confirm(h.id).await?;
                tracing::info!("Handler {} confirmed", handler.id);
            }
        }

        Ok(ConfirmationOutcome::Confirmed)
    }

    /// Send a fresh confirmation link to the logged-in principal
    pub async fn resend_confirmation(&self, principal: &Principal) -> Result<()> {
        let (kind, account) = self.get_account(principal).await?;

        if account.confirmed() {
            return Err(AppError::Conflict(
                "Your account is already confirmed".to_string(),
            ));
        }

        self.notifier
            .send_confirmation(kind, account.email(), account.display_name())
    }

    /// Mail a reset link if the address belongs to an account; silent otherwise
    pub async fn request_password_reset(&self, kind: PrincipalKind, email: &str) -> Result<()> {
        match self.find_account(kind, email).await? {
            Some(account) => {
                self.notifier
                    .send_password_reset(kind, account.email(), account.display_name())?;
            }
            None => tracing::debug!("Password reset requested for unknown {} address", kind),
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        kind: PrincipalKind,
        token: &str,
        dto: &PasswordResetDto,
    ) -> Result<()> {
        let email = match self.tokens.verify(token, kind, TokenPurpose::PasswordReset) {
            TokenVerification::Valid(email) => email,
            TokenVerification::Expired | TokenVerification::Malformed => {
                return Err(AppError::Unauthorized(INVALID_LINK.to_string()));
            }
        };

        let account = self
            .find_account(kind, &email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_LINK.to_string()))?;

        let id = account.id();
        let hash = hash_password(&dto.password)?;
        match account {
            Account::User(u) => self.users.set_password(u.id, &hash).await?,
            Account::Handler(h) => self.handlers.set_password(h.id, &hash).await?,
        }

        tracing::info!("{} {} reset their password", kind, id);
        Ok(())
    }

    pub async fn change_password(&self, principal: &Principal, dto: &ChangePasswordDto) -> Result<()> {
        let (kind, account) = self.get_account(principal).await?;

        if !account.verify_password(&dto.current_password) {
            return Err(AppError::field("current_password", "Invalid password."));
        }

        let id = account.id();
        let hash = hash_password(&dto.new_password)?;
        match account {
            Account::User(u) => self.users.set_password(u.id, &hash).await?,
            Account::Handler(h) => self.handlers.set_password(h.id, &hash).await?,
        }

        tracing::info!("{} {} changed their password", kind, id);
        Ok(())
    }

    /// Move the account to a new address, which must be confirmed again
    pub async fn change_email(&self, principal: &Principal, dto: &ChangeEmailDto) -> Result<()> {
        let (kind, account) = self.get_account(principal).await?;

        if !account.verify_password(&dto.password) {
            return Err(AppError::field("password", "Invalid password."));
        }

        let email = dto.email.trim().to_lowercase();
        if email == account.email() {
            return Err(AppError::field(
                "email",
                "The new email address is the same as the current one.",
            ));
        }
        if self.find_account(kind, &email).await?.is_some() {
            return Err(AppError::field("email", "Email is already registered."));
        }

        let (email, name) = match account {
            Account::User(u) => {
                let user = self.users.change_email(u.id, &email).await?;
                (user.email, user.username)
            }
            Account::Handler(h) => {
                let handler = self.handlers.change_email(h.id, &email).await?;
                (handler.email, handler.name)
            }
        };

        self.notifier.send_email_change(kind, &email, &name)
    }

    /// Find or create the citizen behind an OAuth2 identity
    pub async fn oauth_login(&self, provider: OAuthProvider, email: &str) -> Result<User> {
        if let Some(user) = self.users.find_by_email(email).await? {
            if !user.active {
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            tracing::info!("User {} logged in with {}", user.id, provider.as_str());
            return Ok(user);
        }

        let role = if self.is_administrator_email(email) {
            self.roles.get_by_title(ROLE_ADMINISTRATOR).await?
        } else {
            self.roles.get_default().await?
        };

        let username = self.unused_username(email).await?;
        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                username,
                phone_number: None,
                password_hash: None,
                confirmed: true,
                role_id: role.id,
            })
            .await?;

        // The provider vouched for the address, so the usual Guest -> Reporter upgrade applies
        let user = self.users.confirm(user.id).await?;
        tracing::info!("User {} registered through {}", user.id, provider.as_str());
        Ok(user)
    }

    async fn unused_username(&self, email: &str) -> Result<String> {
        let base = username_from_email(email);
        if !self.users.username_exists(&base).await? {
            return Ok(base);
        }

        for _ in 0..5 {
            let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
            let candidate = format!("{}_{}", base, suffix);
            if !self.users.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a username for this account".to_string(),
        ))
    }
}

/// Local part of the address reduced to a valid username
fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let cleaned: String = local
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(40)
        .collect();

    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => cleaned,
        _ => format!("user_{}", cleaned),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::PgPool;

    use super::*;
    use crate::core::config::OAuthConfig;
    use crate::core::error::field_messages;
    use crate::modules::mail::{LogTransport, Mailer, TemplateRenderer};
    use crate::shared::constants::{ROLE_GUEST, ROLE_REPORTER, STARTING_POINTS};
    use crate::shared::validation::USERNAME_REGEX;

    const SECRET: &str = "test-secret-key-with-at-least-32-bytes!";
    const ADMIN_EMAIL: &str = "admin@ripoti.test";

    fn service(pool: &PgPool) -> (AuthService, Arc<TokenSigner>) {
        let renderer = TemplateRenderer::new().unwrap();
        let (mailer, worker) = Mailer::new(
            renderer,
            Arc::new(LogTransport),
            "noreply@ripoti.test".to_string(),
            "[Ripoti Taka]".to_string(),
        );
        tokio::spawn(worker.run());

        let tokens = Arc::new(TokenSigner::new(SECRET, 3600));
        let notifier = Arc::new(AccountNotifier::new(
            mailer,
            Arc::clone(&tokens),
            "http://localhost:3000",
            "Ripoti Taka",
        ));
        let oauth = OAuthClient::new(
            OAuthConfig {
                google: None,
                github: None,
            },
            "http://localhost:3000",
        )
        .unwrap();

        let service = AuthService::new(
            Arc::new(UserService::new(pool.clone())),
            Arc::new(HandlerService::new(pool.clone())),
            Arc::new(RoleService::new(pool.clone())),
            Arc::clone(&tokens),
            notifier,
            Arc::new(SessionManager::new(SECRET, Duration::from_secs(3600), false)),
            Arc::new(oauth),
            Some(ADMIN_EMAIL.to_string()),
        );
        (service, tokens)
    }

    fn registration(email: &str, username: &str) -> RegisterUserDto {
        RegisterUserDto {
            email: email.to_string(),
            username: username.to_string(),
            phone_number: "+254712345678".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    async fn user_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn role_title(pool: &PgPool, user_id: Uuid) -> String {
        sqlx::query_scalar(
            "SELECT r.title FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_registration_stores_one_guest(pool: PgPool) {
        let (service, _) = service(&pool);

        let user = service
            .register_user(registration(" Wanjiru@Example.com ", "wanjiru"))
            .await
            .unwrap();

        assert_eq!(user.email, "wanjiru@example.com");
        assert!(!user.confirmed);
        assert_eq!(user.points_acquired, STARTING_POINTS);
        assert_ne!(user.password_hash.as_deref(), Some("secret1"));
        assert_eq!(user_count(&pool).await, 1);
        assert_eq!(role_title(&pool, user.id).await, ROLE_GUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_and_username_rejected(pool: PgPool) {
        let (service, _) = service(&pool);
        service
            .register_user(registration("wanjiru@example.com", "wanjiru"))
            .await
            .unwrap();

        let err = service
            .register_user(registration("WANJIRU@example.com", "wanjiru"))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidFields(ref errors) => assert_eq!(
                field_messages(errors),
                vec![
                    "email: Email is already registered.".to_string(),
                    "username: Username is already taken.".to_string(),
                ]
            ),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(user_count(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_confirmation_promotes_guest_to_reporter(pool: PgPool) {
        let (service, tokens) = service(&pool);
        let user = service
            .register_user(registration("otieno@example.com", "otieno"))
            .await
            .unwrap();

        let token = tokens
            .generate(&user.email, PrincipalKind::User, TokenPurpose::Confirmation)
            .unwrap();

        assert_eq!(
            service.confirm(PrincipalKind::User, &token).await.unwrap(),
            ConfirmationOutcome::Confirmed
        );
        assert_eq!(role_title(&pool, user.id).await, ROLE_REPORTER);
        assert_eq!(
            service.confirm(PrincipalKind::User, &token).await.unwrap(),
            ConfirmationOutcome::AlreadyConfirmed
        );

        // A reset token is not a confirmation token
        let reset = tokens
            .generate(&user.email, PrincipalKind::User, TokenPurpose::PasswordReset)
            .unwrap();
        assert!(matches!(
            service.confirm(PrincipalKind::User, &reset).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_administrator_email_gets_administrator_role(pool: PgPool) {
        let (service, _) = service(&pool);
        let user = service
            .register_user(registration("Admin@Ripoti.test", "county_admin"))
            .await
            .unwrap();

        assert_eq!(role_title(&pool, user.id).await, ROLE_ADMINISTRATOR);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_answers_generically(pool: PgPool) {
        let (service, _) = service(&pool);
        let user = service
            .register_user(registration("akinyi@example.com", "akinyi"))
            .await
            .unwrap();

        let login = |email: &str, password: &str| LoginDto {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: false,
            next: None,
        };

        assert_eq!(
            service
                .login(PrincipalKind::User, &login("AKINYI@example.com", "secret1"))
                .await
                .unwrap(),
            user.id
        );

        for dto in [
            login("akinyi@example.com", "wrong"),
            login("nobody@example.com", "secret1"),
        ] {
            match service.login(PrincipalKind::User, &dto).await {
                Err(AppError::Unauthorized(message)) => assert_eq!(message, INVALID_CREDENTIALS),
                other => panic!("unexpected result: {:?}", other),
            }
        }

        // Citizens cannot sign in on the staff side
        assert!(matches!(
            service
                .login(PrincipalKind::Handler, &login("akinyi@example.com", "secret1"))
                .await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_oauth_login_reuses_existing_account(pool: PgPool) {
        let (service, _) = service(&pool);
        let existing = service
            .register_user(registration("kamau@example.com", "kamau"))
            .await
            .unwrap();

        let same = service
            .oauth_login(OAuthProvider::Github, "kamau@example.com")
            .await
            .unwrap();
        assert_eq!(same.id, existing.id);

        let created = service
            .oauth_login(OAuthProvider::Google, "njeri.w@example.com")
            .await
            .unwrap();
        assert!(created.confirmed);
        assert!(created.password_hash.is_none());
        assert_eq!(created.username, "njeri_w");
        assert_eq!(role_title(&pool, created.id).await, ROLE_REPORTER);
        assert_eq!(user_count(&pool).await, 2);
    }

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email("jane.doe@example.com"), "jane_doe");
        assert_eq!(username_from_email("42nd@example.com"), "user_42nd");
        assert_eq!(username_from_email("@example.com"), "user_");

        for email in ["jane.doe@x.com", "42nd@x.com", "a+b@x.com", "@x.com"] {
            assert!(USERNAME_REGEX.is_match(&username_from_email(email)));
        }
    }
}
