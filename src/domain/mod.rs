//! Domain layer - Core entities, validation rules and repository traits

pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{NewUser, User, UserId, UserProfile, UserRepository};
