//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::user::AuthService;

/// Application state shared by all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    /// None when rate limiting is disabled
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self {
            auth_service,
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }
}
