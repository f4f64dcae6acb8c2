//! authgate - credential-based session layer
//!
//! Email/password signup and login, stateless signed session tokens carried
//! in an `HttpOnly` cookie, and a gate that resolves the cookie to a stored
//! identity before protected handlers run.

pub mod core;
