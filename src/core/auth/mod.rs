//! Authentication module for authgate
//!
//! This module provides authentication functionality including:
//! - Password hashing (bcrypt)
//! - JWT session token issuance and verification
//! - Signup, login, logout, password change and account deletion flows
//! - The session gate that protects routes
//! - REST API endpoints with cookie transport

pub mod api;
pub mod cookie;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use cookie::SessionCookie;
pub use gate::{CurrentUser, SessionGate, require_auth};
pub use jwt::{Claims, IssuedToken, JwtConfig, JwtService, TokenError};
pub use password::{PasswordError, PasswordHasher};
pub use service::{
    AuthError, AuthResponse, AuthService, LoginRequest, SignupRequest, UnauthenticatedReason,
};
