//! HTTP client for the auth endpoints
//!
//! Used by the `client` subcommand. The token returned by login is kept in a
//! local file and sent back as a bearer header.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::api::auth::{LoginResponse, MessageResponse, ProfileResponse};
use crate::api::types::ApiErrorResponse;
use crate::domain::user::UserProfile;

/// Client-side failures
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not logged in; run `client login` first")]
    NotLoggedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin wrapper over `reqwest` for signup, login and profile
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user; returns the server's confirmation message
    pub async fn signup(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url("/signup"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let body: MessageResponse = parse_response(response).await?;
        Ok(body.message)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        parse_response(response).await
    }

    pub async fn profile(&self, token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .client
            .get(self.url("/profile"))
            .bearer_auth(token)
            .send()
            .await?;

        let body: ProfileResponse = parse_response(response).await?;
        Ok(body.profile)
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status,
        message: error_message(&text, status),
    })
}

fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse::Message { message }) => message,
        Ok(ApiErrorResponse::Errors { errors }) => errors
            .into_iter()
            .map(|issue| issue.msg)
            .collect::<Vec<_>>()
            .join("; "),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    }
}

/// File-backed storage for the session token
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token; `None` when no token has been saved
    pub async fn load(&self) -> Result<Option<String>, ClientError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, token).await?;
        Ok(())
    }

    /// Remove the stored token; returns false if there was none
    pub async fn delete(&self) -> Result<bool, ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
