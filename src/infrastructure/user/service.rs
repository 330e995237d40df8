//! Auth service: signup, login and token-gated profile lookup

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::user::{
    validate_login, validate_signup, NewUser, User, UserId, UserProfile, UserRepository,
    UserValidationError,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::{TokenClaims, TokenError, TokenService, TokenSubject};
use crate::infrastructure::observability::{record_login, record_signup, record_token_rejection};

use super::password::PasswordHasher;

/// Plaintext used to produce the hash checked when a login names an unknown user
const DUMMY_PASSWORD: &str = "pmp-auth-timing-equalizer";

/// A single invalid request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<UserValidationError> for FieldError {
    fn from(err: UserValidationError) -> Self {
        Self {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("token missing")]
    TokenMissing,

    #[error("invalid token: {0}")]
    Token(#[from] TokenError),

    #[error("user not found")]
    UserNotFound,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<UserValidationError>> for AuthError {
    fn from(errors: Vec<UserValidationError>) -> Self {
        Self::Validation(errors.into_iter().map(FieldError::from).collect())
    }
}

impl From<DomainError> for AuthError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Storage { message } => Self::Storage(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Token handed back on successful login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates the credential store, the password hasher and the token service
pub struct AuthService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    dummy_hash: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create a new auth service
    ///
    /// Hashes a throwaway password once so failed logins for unknown users
    /// pay the same hashing cost as wrong-password logins.
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Result<Self, DomainError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            repository,
            hasher,
            tokens,
            dummy_hash,
        })
    }

    /// Register a new user
    pub async fn signup(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if let Err(errors) = validate_signup(username, password) {
            record_signup("invalid");
            debug!(username = %username, violations = errors.len(), "Signup rejected by validation");
            return Err(errors.into());
        }

        let password_hash = self.hash_password(password).await.inspect_err(|_| {
            record_signup("error");
        })?;

        match self
            .repository
            .create(NewUser::new(username, password_hash))
            .await
        {
            Ok(user) => {
                record_signup("created");
                info!(username = %user.username(), user_id = %user.id(), "User signed up");
                Ok(user)
            }
            Err(e) if e.is_conflict() => {
                record_signup("duplicate");
                info!(username = %username, "Signup rejected: username taken");
                Err(AuthError::DuplicateUsername)
            }
            Err(e) => {
                record_signup("error");
                error!(username = %username, error = %e, "Failed to create user");
                Err(e.into())
            }
        }
    }

    /// Check credentials and issue a session token
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if let Err(errors) = validate_login(username, password) {
            record_login("invalid");
            return Err(errors.into());
        }

        let user = self
            .repository
            .find_by_username(username)
            .await
            .inspect_err(|e| {
                record_login("error");
                error!(username = %username, error = %e, "Failed to look up user");
            })?;

        let user = match user {
            Some(user) => user,
            None => {
                self.verify_password(password, self.dummy_hash.clone())
                    .await?;
                record_login("failed");
                info!(username = %username, "Login failed: unknown user");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .verify_password(password, user.password_hash().to_string())
            .await?
        {
            record_login("failed");
            info!(username = %username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = self.tokens.ttl();
        let token = self
            .tokens
            .issue(&TokenSubject::from(&user), ttl)
            .inspect_err(|e| {
                record_login("error");
                error!(username = %username, error = %e, "Failed to issue token");
            })?;

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        record_login("success");
        info!(username = %user.username(), user_id = %user.id(), "User logged in");

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a presented session token
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.verify(token).map_err(|e| {
            record_token_rejection(e.category());
            warn!(reason = e.category(), "Rejected session token");
            AuthError::Token(e)
        })
    }

    /// Public profile for an authenticated user
    pub async fn profile(&self, id: &UserId) -> Result<UserProfile, AuthError> {
        let user = self.repository.find_by_id(id).await.inspect_err(|e| {
            error!(user_id = %id, error = %e, "Failed to load profile");
        })?;

        user.map(|u| u.profile()).ok_or_else(|| {
            info!(user_id = %id, "Token refers to a missing user");
            AuthError::UserNotFound
        })
    }

    /// Check that the credential store is reachable
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.repository.ping().await
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::MockUserRepository;
    use crate::infrastructure::auth::{JwtConfig, JwtService, DEFAULT_TOKEN_TTL};
    use crate::infrastructure::user::password::fast_hasher;
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    fn jwt() -> Arc<dyn TokenService> {
        Arc::new(JwtService::new(JwtConfig::new("service-test-secret", DEFAULT_TOKEN_TTL)).unwrap())
    }

    fn create_service_with(repository: Arc<dyn UserRepository>) -> AuthService {
        AuthService::new(repository, Arc::new(fast_hasher()), jwt()).unwrap()
    }

    fn create_service() -> (AuthService, Arc<InMemoryUserRepository>) {
        let repository = Arc::new(InMemoryUserRepository::new());
        (create_service_with(repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_signup_stores_hashed_password() {
        let (service, repository) = create_service();

        let user = service.signup("alice", "secret123").await.unwrap();
        assert_eq!(user.username(), "alice");
        assert_ne!(user.password_hash(), "secret123");
        assert!(user.password_hash().starts_with("$argon2id$"));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_signup_validation_creates_nothing() {
        let (service, repository) = create_service();

        let short_username = service.signup("ab", "secret123").await;
        let short_password = service.signup("alice", "12345").await;
        let both = service.signup("", "").await;

        assert!(matches!(short_username, Err(AuthError::Validation(ref e)) if e.len() == 1 && e[0].field == "username"));
        assert!(matches!(short_password, Err(AuthError::Validation(ref e)) if e.len() == 1 && e[0].field == "password"));
        assert!(matches!(both, Err(AuthError::Validation(ref e)) if e.len() == 2));
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let (service, repository) = create_service();

        service.signup("alice", "secret123").await.unwrap();
        let result = service.signup("alice", "another-password").await;

        assert!(matches!(result, Err(AuthError::DuplicateUsername)));
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_signup_single_winner() {
        let (service, repository) = create_service();
        let service = Arc::new(service);

        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.signup("racer", "password-a").await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.signup("racer", "password-b").await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let created = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::DuplicateUsername)))
            .count();

        assert_eq!(created, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let (service, _) = create_service();
        let user = service.signup("alice", "secret123").await.unwrap();

        let issued = service.login("alice", "secret123").await.unwrap();
        let claims = service.verify_token(&issued.token).unwrap();

        assert_eq!(claims.id, user.id().value());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(issued.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = create_service();
        service.signup("alice", "secret123").await.unwrap();

        let wrong_password = service.login("alice", "wrong-password").await.unwrap_err();
        let unknown_user = service.login("bob", "secret123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (service, _) = create_service();

        let result = service.login("", "").await;

        match result {
            Err(AuthError::Validation(errors)) => {
                assert_eq!(errors[0].message, "Username is required");
                assert_eq!(errors[1].message, "Password is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let (service, _) = create_service();
        let user = service.signup("alice", "secret123").await.unwrap();

        let profile = service.profile(&user.id()).await.unwrap();
        assert_eq!(profile.username, "alice");

        let missing = service.profile(&UserId::new(999)).await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_verify_token_rejects_garbage() {
        let (service, _) = create_service();

        let result = service.verify_token("not-a-token");
        assert!(matches!(result, Err(AuthError::Token(TokenError::Malformed))));
    }

    #[tokio::test]
    async fn test_storage_failure_on_signup() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_create()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = create_service_with(Arc::new(repository));
        let result = service.signup("alice", "secret123").await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_on_login() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_username()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = create_service_with(Arc::new(repository));
        let result = service.login("alice", "secret123").await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_on_profile() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_id()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = create_service_with(Arc::new(repository));
        let result = service.profile(&UserId::new(1)).await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_ping_delegates_to_repository() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_ping()
            .times(1)
            .returning(|| Err(DomainError::storage("down")));

        let service = create_service_with(Arc::new(repository));
        assert!(service.ping().await.is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = AuthError::from(vec![
            UserValidationError::UsernameTooShort(3),
            UserValidationError::PasswordTooShort(6),
        ]);

        assert_eq!(
            err.to_string(),
            "validation failed: Username must be at least 3 characters long; Password must be at least 6 characters long"
        );
    }
}
