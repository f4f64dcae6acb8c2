//! Authentication service
//!
//! Provides business logic for signup, login, logout, password change and
//! account deletion. Coordinates between the credential store, the password
//! hasher and the JWT service; one instance is built at startup and shared
//! by every handler and by the session gate.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::core::auth::jwt::{IssuedToken, JwtService, TokenError};
use crate::core::auth::password::{MAX_PASSWORD_BYTES, PasswordError, PasswordHasher};
use crate::core::db::models::{CreateUser, UserResponse};
use crate::core::db::repositories::{StoreError, UserStore};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hashed once per service and verified against when a login names an
/// unknown email, so both failure paths pay for one bcrypt check.
const DUMMY_PASSWORD: &str = "authgate-unknown-account";

/// Why the session gate turned a request away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// No session artifact on the request
    NoToken,
    /// Signature or format check failed
    InvalidToken,
    /// Correctly signed but past its expiry
    Expired,
    /// The identity named by the token no longer exists
    StaleIdentity,
}

impl fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthenticatedReason::NoToken => write!(f, "no token"),
            UnauthenticatedReason::InvalidToken => write!(f, "invalid token"),
            UnauthenticatedReason::Expired => write!(f, "expired token"),
            UnauthenticatedReason::StaleIdentity => write!(f, "stale identity"),
        }
    }
}

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Backend(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooLong => AuthError::Validation(err.to_string()),
            PasswordError::Hashing(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Unauthenticated(UnauthenticatedReason::Expired),
            TokenError::InvalidSignature => {
                AuthError::Unauthenticated(UnauthenticatedReason::InvalidToken)
            }
            TokenError::Encoding(_) => AuthError::Internal(err.to_string()),
        }
    }
}

/// Signup request data
#[derive(Clone, serde::Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(alias = "name")]
    pub display_name: String,
    pub password: String,
}

/// Login request data
#[derive(Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Request bodies carry plaintext passwords; keep them out of debug output.
impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Authentication response with user data and the session token
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: IssuedToken,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    jwt_service: JwtService,
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, jwt_service: JwtService) -> Self {
        Self {
            store,
            hasher,
            jwt_service,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// The shared token service
    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// The underlying credential store
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Trim and lowercase an email so lookups are case-insensitive
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_ascii_lowercase()
    }

    /// Validate password length
    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }

        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(format!(
                "Password must be at most {} bytes long",
                MAX_PASSWORD_BYTES
            )));
        }

        Ok(())
    }

    async fn dummy_hash(&self) -> Result<&str, AuthError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
            .await?;
        Ok(hash.as_str())
    }

    /// Validate signup input
    fn validate_signup(request: &SignupRequest) -> Result<(), AuthError> {
        if request.email.trim().is_empty()
            || request.display_name.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(AuthError::Validation("All fields are required".to_string()));
        }

        Self::validate_password(&request.password)
    }

    /// Register a new user and issue their first session token
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        Self::validate_signup(&request)?;

        let email = Self::normalize_email(&request.email);

        // Fast path only; the store's uniqueness guarantee decides races.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&request.password).await?;

        let user = self
            .store
            .create(CreateUser {
                email,
                display_name: request.display_name.trim().to_string(),
                password_hash,
            })
            .await?;

        let token = self.jwt_service.issue(user.id)?;

        tracing::info!(user_id = %user.id, "User signed up");

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Login an existing user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let email = Self::normalize_email(&request.email);

        let Some(user) = self.store.find_by_email(&email).await? else {
            let dummy_hash = self.dummy_hash().await?;
            self.hasher.verify(&request.password, dummy_hash).await?;
            tracing::info!("Login failed: unknown email");
            return Err(AuthError::NotFound);
        };

        if !self
            .hasher
            .verify(&request.password, &user.password_hash)
            .await?
        {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt_service.issue(user.id)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Logout. Tokens are stateless, so the only effect is on the client.
    pub fn logout(&self) {
        tracing::debug!("Logout requested");
    }

    /// Change a user's password after checking the current one.
    ///
    /// Tokens issued before the change remain valid until they expire.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation(
                "Current password and new password are required".to_string(),
            ));
        }

        Self::validate_password(new_password)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self
            .hasher
            .verify(current_password, &user.password_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hasher.hash(new_password).await?;
        self.store
            .update_password_hash(user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(())
    }

    /// Delete a user's account
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AuthError> {
        if !self.store.delete(user_id).await? {
            return Err(AuthError::NotFound);
        }

        tracing::info!(user_id = %user_id, "Account deleted");

        Ok(())
    }
}
