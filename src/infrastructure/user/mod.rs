//! User infrastructure module
//!
//! Credential storage (in-memory and PostgreSQL), Argon2 password hashing,
//! and the auth service that ties them to session tokens.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, HashingConfig, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{AuthError, AuthService, FieldError, IssuedToken};

#[cfg(test)]
pub(crate) use password::fast_hasher;
