//! Session gate
//!
//! Resolves the session cookie on an inbound request to a stored identity,
//! or rejects the request. Protected routes are wrapped with
//! [`require_auth`] and read the identity through the [`CurrentUser`]
//! extractor:
//!
//! 1. No cookie -> `Unauthenticated(NoToken)`
//! 2. Bad signature / expired -> `Unauthenticated(InvalidToken | Expired)`
//! 3. Identity gone from the store -> `Unauthenticated(StaleIdentity)`
//!
//! Store failures are reported as `Internal`, never as a rejection.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::core::auth::cookie::SessionCookie;
use crate::core::auth::service::{AuthError, AuthService, UnauthenticatedReason};
use crate::core::db::models::UserResponse;

/// The identity attached to a request that passed the gate
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserResponse);

/// Token-to-identity resolution shared by every protected route
#[derive(Clone)]
pub struct SessionGate {
    auth_service: AuthService,
    cookie: SessionCookie,
}

impl SessionGate {
    /// Create a gate over the shared auth service
    pub fn new(auth_service: AuthService, cookie: SessionCookie) -> Self {
        Self {
            auth_service,
            cookie,
        }
    }

    /// Session cookie settings
    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// Resolve a session token to the identity it names
    pub async fn authenticate(&self, token: Option<&str>) -> Result<UserResponse, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::NoToken))?;

        let user_id = self.auth_service.jwt().verify(token)?;

        match self.auth_service.store().find_by_id(user_id).await {
            Ok(Some(user)) => Ok(user.into()),
            Ok(None) => Err(AuthError::Unauthenticated(
                UnauthenticatedReason::StaleIdentity,
            )),
            Err(e) => {
                tracing::error!(user_id = %user_id, "Identity lookup failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Resolve the session cookie in a jar
    pub async fn authenticate_jar(&self, jar: &CookieJar) -> Result<UserResponse, AuthError> {
        let token = self.cookie.token(jar);
        self.authenticate(token.as_deref()).await
    }
}

/// Middleware that admits only requests carrying a valid session
pub async fn require_auth(
    State(gate): State<SessionGate>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match gate.authenticate_jar(&jar).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        Err(AuthError::Unauthenticated(reason)) => {
            tracing::debug!(
                path = %request.uri().path(),
                "Request rejected by session gate: {}",
                reason
            );
            Err(AuthError::Unauthenticated(reason))
        }
        Err(e) => Err(e),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::NoToken))
    }
}
