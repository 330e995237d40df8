//! User input validation
//!
//! Validation collects every violated rule instead of stopping at the first
//! one, so clients can report all field problems at once.

use thiserror::Error;

/// A single rule violation on a credential field
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    #[error("Username is required")]
    UsernameRequired,

    #[error("Username must be at least {0} characters long")]
    UsernameTooShort(usize),

    #[error("Username must be at most {0} characters long")]
    UsernameTooLong(usize),

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),
}

impl UserValidationError {
    /// Name of the request field the violation refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::UsernameRequired | Self::UsernameTooShort(_) | Self::UsernameTooLong(_) => {
                "username"
            }
            Self::PasswordRequired | Self::PasswordTooShort(_) => "password",
        }
    }
}

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate signup credentials
///
/// Rules (lengths in characters):
/// - Username between 3 and 255 characters
/// - Password at least 6 characters
pub fn validate_signup(username: &str, password: &str) -> Result<(), Vec<UserValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_username(username) {
        errors.push(e);
    }

    if let Err(e) = validate_password(password) {
        errors.push(e);
    }

    into_result(errors)
}

/// Validate login credentials: both fields must be present
pub fn validate_login(username: &str, password: &str) -> Result<(), Vec<UserValidationError>> {
    let mut errors = Vec::new();

    if username.is_empty() {
        errors.push(UserValidationError::UsernameRequired);
    }

    if password.is_empty() {
        errors.push(UserValidationError::PasswordRequired);
    }

    into_result(errors)
}

pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if length > MAX_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    Ok(())
}

fn into_result(errors: Vec<UserValidationError>) -> Result<(), Vec<UserValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
