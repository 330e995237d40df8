//! JWT session token issuance and verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// Default session lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub id: i64,
    pub username: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl TokenClaims {
    /// Create claims for a subject, valid for `ttl` from `issued_at`
    pub fn new(subject: &TokenSubject, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();

        Self {
            id: subject.id.value(),
            username: subject.username.clone(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.id)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Identity bound into a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_string(),
        }
    }
}

/// Why a presented token was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Short label used for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed,
        }
    }
}

/// Configuration for JWT service
#[derive(Debug)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Token lifetime
    pub ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            ttl,
        }
    }
}

/// Trait for session token operations
pub trait TokenService: Send + Sync + Debug {
    /// Sign a token for the subject that expires `ttl` from now
    fn issue(&self, subject: &TokenSubject, ttl: Duration) -> Result<String, DomainError>;

    /// Check signature and expiry and return the claims
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;

    /// Configured token lifetime
    fn ttl(&self) -> Duration;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service; the secret must not be empty
    pub fn new(config: JwtConfig) -> Result<Self, DomainError> {
        let secret = config.secret.expose_secret();

        if secret.is_empty() {
            return Err(DomainError::configuration("JWT secret must not be empty"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: config.ttl,
        })
    }
}

impl TokenService for JwtService {
    fn issue(&self, subject: &TokenSubject, ttl: Duration) -> Result<String, DomainError> {
        let claims = TokenClaims::new(subject, Utc::now(), ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Generate a random base64url signing secret from `bytes` bytes of OS entropy
pub fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-12345";

    fn create_service() -> JwtService {
        JwtService::new(JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL)).unwrap()
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            id: UserId::new(42),
            username: "testuser".to_string(),
        }
    }

    fn sign(claims: &TokenClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let service = create_service();

        let token = service.issue(&subject(), DEFAULT_TOKEN_TTL).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.user_id(), UserId::new(42));
    }

    #[test]
    fn test_malformed_token() {
        let service = create_service();

        assert_eq!(service.verify("invalid-token"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_flipped_signature_byte() {
        let service = create_service();
        let token = service.issue(&subject(), DEFAULT_TOKEN_TTL).unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[signature_start] = if bytes[signature_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(service.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let service = create_service();
        let token = service.issue(&subject(), DEFAULT_TOKEN_TTL).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged = TokenClaims::new(
            &TokenSubject {
                id: UserId::new(1),
                username: "admin".to_string(),
            },
            Utc::now(),
            DEFAULT_TOKEN_TTL,
        );
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(service.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtService::new(JwtConfig::new("secret-2", DEFAULT_TOKEN_TTL)).unwrap();
        let token = other.issue(&subject(), DEFAULT_TOKEN_TTL).unwrap();

        assert_eq!(
            create_service().verify(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token() {
        let service = create_service();
        let issued = Utc::now() - chrono::Duration::hours(2);
        let claims = TokenClaims::new(&subject(), issued, DEFAULT_TOKEN_TTL);

        let token = sign(&claims, SECRET);

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_has_no_leeway() {
        let service = create_service();
        let issued = Utc::now() - chrono::Duration::seconds(3605);
        let claims = TokenClaims::new(&subject(), issued, DEFAULT_TOKEN_TTL);

        assert_eq!(
            service.verify(&sign(&claims, SECRET)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_oversized_ttl_saturates_instead_of_expiring() {
        let claims = TokenClaims::new(&subject(), Utc::now(), Duration::from_secs(u64::MAX));
        assert_eq!(claims.exp, i64::MAX);
        assert!(claims.exp > claims.iat);

        let service = create_service();
        let token = service
            .issue(&subject(), Duration::from_secs(u64::MAX))
            .unwrap();

        assert!(service.verify(&token).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = JwtService::new(JwtConfig::new("", DEFAULT_TOKEN_TTL));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", create_service());
        assert!(!debug.contains(SECRET));

        let config = JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL);
        assert!(!format!("{:?}", config).contains(SECRET));
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(32);
        assert_eq!(URL_SAFE_NO_PAD.decode(&secret).unwrap().len(), 32);
        assert_ne!(secret, generate_secret(32));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(TokenError::Expired.category(), "expired");
        assert_eq!(TokenError::InvalidSignature.category(), "invalid_signature");
        assert_eq!(TokenError::Malformed.category(), "malformed");
    }
}
