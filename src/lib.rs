//! PMP Auth Service
//!
//! Username/password authentication with:
//! - Signup with Argon2id password hashing
//! - Login issuing short-lived HS256 bearer tokens
//! - A token-gated profile endpoint
//! - In-memory or PostgreSQL user storage

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::{
    auth::JwtService,
    rate_limit::RateLimiter,
    storage::StorageFactory,
    user::{Argon2Hasher, AuthService},
};
use tracing::info;

/// Create the application state with all services initialized
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage_config()?;
    info!("Storage backend: {:?}", storage_config.storage_type());

    let repository = StorageFactory::create_user_repository(&storage_config).await?;
    let hasher = Argon2Hasher::new(config.auth.hashing)?;
    let tokens = JwtService::new(config.jwt_config()?)?;

    let auth_service = AuthService::new(repository, Arc::new(hasher), Arc::new(tokens))?;
    let mut state = AppState::new(Arc::new(auth_service));

    if config.rate_limit.enabled {
        info!(
            window_seconds = config.rate_limit.window_seconds,
            max_requests = config.rate_limit.max_requests,
            "Rate limiting enabled for signup and login"
        );
        state = state.with_rate_limiter(RateLimiter::from_config(&config.rate_limit));
    } else {
        info!("Rate limiting disabled");
    }

    Ok(state)
}
