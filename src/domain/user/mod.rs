//! User domain
//!
//! This module provides domain types and traits for credential
//! authentication: the user entity, input validation, and the store trait.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserId, UserProfile};
pub use repository::UserRepository;
pub use validation::{
    validate_login, validate_password, validate_signup, validate_username, UserValidationError,
    MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};

#[cfg(test)]
pub use repository::MockUserRepository;
