//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/signup - Register a new user and start a session
//! - POST /api/auth/login - Login and start a session
//! - GET /api/auth/logout - Clear the session cookie
//! - GET /api/auth/me - Get current user info (gated)
//! - POST /api/auth/password - Change password (gated)
//! - DELETE /api/auth/account - Delete the account (gated)
//!
//! The session token is only ever transported in the session cookie; it is
//! never part of a response body.

use axum::{
    Json, Router,
    extract::{FromRequest, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::gate::{CurrentUser, SessionGate, require_auth};
use crate::core::auth::service::{
    AuthError, AuthService, LoginRequest, SignupRequest, UnauthenticatedReason,
};
use crate::core::db::models::UserResponse;

/// Shared message for unknown emails and wrong passwords
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Auth API state containing the auth service and the session gate
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub gate: SessionGate,
}

impl AuthApiState {
    pub fn new(auth_service: AuthService, gate: SessionGate) -> Self {
        Self { auth_service, gate }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

fn access_denied_message(reason: UnauthenticatedReason) -> &'static str {
    match reason {
        UnauthenticatedReason::NoToken => "Access denied. No token provided.",
        UnauthenticatedReason::InvalidToken => "Access denied. Invalid token.",
        UnauthenticatedReason::Expired => "Access denied. Token expired.",
        UnauthenticatedReason::StaleIdentity => "Access denied. User no longer exists.",
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, "EMAIL_EXISTS", self.to_string()),
            // Unknown email and wrong password look the same to the client
            AuthError::NotFound | AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            AuthError::Unauthenticated(reason) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                access_denied_message(*reason).to_string(),
            ),
            AuthError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ApiError::new(message, code);

        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejection is a validation error
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());

        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            _ => "Invalid request body",
        };
        AuthError::Validation(message.to_string())
    }
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Request for changing password
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let gate = state.gate.clone();
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route("/api/auth/password", post(change_password_handler))
        .route("/api/auth/account", delete(delete_account_handler))
        .route_layer(middleware::from_fn_with_state(gate, require_auth));

    Router::new()
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// POST /api/auth/signup
async fn signup_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), AuthError> {
    tracing::debug!("Signup attempt");

    let response = state.auth_service.signup(request).await?;
    let cookie = state.gate.cookie().issue(response.token.token);

    Ok((StatusCode::CREATED, jar.add(cookie), Json(response.user)))
}

/// POST /api/auth/login
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), AuthError> {
    let response = state.auth_service.login(request).await?;

    let cookie = state.gate.cookie().issue(response.token.token);

    Ok((jar.add(cookie), Json(response.user)))
}

/// GET /api/auth/logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    state.auth_service.logout();

    (
        jar.add(state.gate.cookie().clear()),
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// GET /api/auth/me
async fn me_handler(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user)
}

/// POST /api/auth/password
async fn change_password_handler(
    State(state): State<Arc<AuthApiState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, AuthError> {
    state
        .auth_service
        .change_password(user.id, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    }))
}

/// DELETE /api/auth/account
async fn delete_account_handler(
    State(state): State<Arc<AuthApiState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>), AuthError> {
    state.auth_service.delete_account(user.id).await?;

    Ok((
        jar.add(state.gate.cookie().clear()),
        Json(SuccessResponse {
            success: true,
            message: "Account deleted".to_string(),
        }),
    ))
}

/// GET /health
async fn health_handler() -> &'static str {
    "ok"
}
