//! Authentication infrastructure module
//!
//! This module provides JWT session token management.

mod jwt;

pub use jwt::{
    generate_secret, JwtConfig, JwtService, TokenClaims, TokenError, TokenService, TokenSubject,
    DEFAULT_TOKEN_TTL,
};
