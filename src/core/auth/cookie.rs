//! Session cookie handling
//!
//! The session token travels in a single `HttpOnly`, `SameSite=Strict`
//! cookie whose max-age matches the token validity window.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Settings for the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    max_age: time::Duration,
    secure: bool,
}

impl SessionCookie {
    /// Create cookie settings; `validity` should be the token validity window
    pub fn new(name: impl Into<String>, validity: chrono::Duration, secure: bool) -> Self {
        Self {
            name: name.into(),
            max_age: time::Duration::seconds(validity.num_seconds()),
            secure,
        }
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the cookie that carries a freshly issued token
    pub fn issue(&self, token: impl Into<String>) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token.into()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .max_age(self.max_age)
            .build()
    }

    /// Build an already-expired cookie that overwrites the session cookie
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .build();
        cookie.make_removal();
        cookie
    }

    /// Read the session token from a request's cookies
    pub fn token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty())
    }
}
