//! Bearer token authentication extractor

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::auth::{TokenClaims, TokenError};
use crate::infrastructure::observability::record_token_rejection;
use crate::infrastructure::user::AuthError;

/// Extractor that requires a valid session token
///
/// Reads `Authorization: Bearer <token>`. A missing or blank header is rejected
/// with 401; any other header that does not carry a verifiable bearer token,
/// including a bare `Bearer`, with 403.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).inspect_err(|e| {
            if let AuthError::Token(reason) = e {
                record_token_rejection(reason.category());
                warn!(reason = reason.category(), "Rejected Authorization header");
            }
        })?;

        debug!("Validating session token");

        let claims = state.auth_service.verify_token(&token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::TokenMissing);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::Token(TokenError::Malformed))?;

    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => Err(AuthError::TokenMissing),
        (Some(scheme), Some(token), None) if is_bearer(scheme) => Ok(token.to_string()),
        _ => Err(AuthError::Token(TokenError::Malformed)),
    }
}

fn is_bearer(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("bearer")
}
