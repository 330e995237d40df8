//! Infrastructure layer - External service implementations

pub mod auth;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod storage;
pub mod user;
