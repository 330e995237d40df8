//! Authentication API endpoints
//!
//! Signup, login and the token-gated profile lookup.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{rate_limit_middleware, AuthenticatedUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::user::UserProfile;

const MSG_SIGNUP_OK: &str = "User created successfully";
const MSG_SIGNUP_FAILED: &str = "Error creating user. Try again.";
const MSG_LOGIN_OK: &str = "Login successful";
const MSG_LOGIN_FAILED: &str = "Error logging in. Try again.";
const MSG_PROFILE_FAILED: &str = "Error retrieving profile";

/// Create the authentication router; signup and login are rate limited
pub fn create_auth_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
        .route("/profile", get(profile))
}

/// Username/password pair; absent fields deserialize as empty strings
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .auth_service
        .signup(&request.username, &request.password)
        .await
        .map_err(|e| ApiError::from_auth(e, MSG_SIGNUP_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: MSG_SIGNUP_OK.to_string(),
        }),
    ))
}

/// POST /login
///
/// Wrong password and unknown username produce the same 401 body.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let issued = state
        .auth_service
        .login(&request.username, &request.password)
        .await
        .map_err(|e| ApiError::from_auth(e, MSG_LOGIN_FAILED))?;

    Ok(Json(LoginResponse {
        token: issued.token,
        message: MSG_LOGIN_OK.to_string(),
    }))
}

/// GET /profile
pub async fn profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .auth_service
        .profile(&claims.user_id())
        .await
        .map_err(|e| ApiError::from_auth(e, MSG_PROFILE_FAILED))?;

    Ok(Json(ProfileResponse { profile }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::state::test_support::{test_state, test_state_with_limit, TEST_SECRET};
    use crate::domain::user::UserId;
    use crate::infrastructure::auth::{TokenClaims, TokenSubject};

    fn app(state: AppState) -> Router {
        create_auth_router(state.clone()).with_state(state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_profile(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/profile");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn signup_and_login(app: &Router, username: &str, password: &str) -> String {
        let credentials = json!({ "username": username, "password": password });

        let (status, _) = send(app, post_json("/signup", credentials.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(app, post_json("/login", credentials)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signup_created() {
        let app = app(test_state());

        let (status, body) = send(
            &app,
            post_json("/signup", json!({ "username": "alice", "password": "secret123" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "User created successfully" }));
    }

    #[tokio::test]
    async fn test_signup_validation_errors() {
        let app = app(test_state());

        let (status, body) = send(
            &app,
            post_json("/signup", json!({ "username": "ab", "password": "12345" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "errors": [
                    {
                        "msg": "Username must be at least 3 characters long",
                        "path": "username",
                        "location": "body"
                    },
                    {
                        "msg": "Password must be at least 6 characters long",
                        "path": "password",
                        "location": "body"
                    }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_signup_missing_fields_are_validation_errors() {
        let app = app(test_state());

        let (status, body) = send(&app, post_json("/signup", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let app = app(test_state());
        let credentials = json!({ "username": "alice", "password": "secret123" });

        send(&app, post_json("/signup", credentials.clone())).await;
        let (status, body) = send(&app, post_json("/signup", credentials)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "message": "Username already exists" }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = app(test_state());
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\":"))
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"][0]["msg"].is_string());
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let app = app(test_state());

        let token = signup_and_login(&app, "alice", "secret123").await;

        assert_eq!(token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_login_failures_have_identical_shape() {
        let app = app(test_state());
        signup_and_login(&app, "alice", "secret123").await;

        let wrong_password = send(
            &app,
            post_json("/login", json!({ "username": "alice", "password": "wrong-pass" })),
        )
        .await;
        let unknown_user = send(
            &app,
            post_json("/login", json!({ "username": "nobody", "password": "secret123" })),
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(
            wrong_password.1,
            json!({ "message": "Invalid username or password" })
        );
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let app = app(test_state());

        let (status, body) = send(&app, post_json("/login", json!({ "username": "alice" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "Password is required");
        assert_eq!(body["errors"][0]["path"], "password");
    }

    #[tokio::test]
    async fn test_profile_with_token() {
        let app = app(test_state());
        let token = signup_and_login(&app, "alice", "secret123").await;

        let (status, body) =
            send(&app, get_profile(Some(&format!("Bearer {}", token)))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "profile": { "username": "alice" } }));
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_profile_without_token() {
        let app = app(test_state());

        let (status, body) = send(&app, get_profile(None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Token missing, access denied" }));
    }

    #[tokio::test]
    async fn test_profile_with_invalid_token() {
        let app = app(test_state());

        for header_value in ["Bearer not-a-jwt", "Basic dXNlcjpwYXNz", "Bearer"] {
            let (status, body) = send(&app, get_profile(Some(header_value))).await;

            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body, json!({ "message": "Invalid token, access denied" }));
        }
    }

    #[tokio::test]
    async fn test_profile_with_expired_token() {
        let app = app(test_state());
        let token = signup_and_login(&app, "alice", "secret123").await;
        assert!(!token.is_empty());

        let issued = chrono::Utc::now() - chrono::Duration::hours(3);
        let claims = TokenClaims::new(
            &TokenSubject {
                id: UserId::new(1),
                username: "alice".to_string(),
            },
            issued,
            std::time::Duration::from_secs(3600),
        );
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let (status, _) = send(&app, get_profile(Some(&format!("Bearer {}", expired)))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile_for_missing_user() {
        let app = app(test_state());

        let claims = TokenClaims::new(
            &TokenSubject {
                id: UserId::new(404),
                username: "ghost".to_string(),
            },
            chrono::Utc::now(),
            std::time::Duration::from_secs(3600),
        );
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let (status, body) = send(&app, get_profile(Some(&format!("Bearer {}", token)))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));
    }

    #[tokio::test]
    async fn test_signup_and_login_are_rate_limited() {
        let app = app(test_state_with_limit(2));
        let credentials = json!({ "username": "alice", "password": "secret123" });

        send(&app, post_json("/signup", credentials.clone())).await;
        send(&app, post_json("/login", credentials.clone())).await;
        let (status, body) = send(&app, post_json("/login", credentials)).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body,
            json!({ "message": "Too many requests from this IP, please try again later" })
        );

        // profile is not limited
        let (status, _) = send(&app, get_profile(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
