//! JWT utilities for session token generation and validation
//!
//! Tokens are HS256-signed, carry the identity id as `sub`, and expire after
//! a fixed validity window (10 hours by default). Verification checks the
//! signature before the expiry; a token is only valid while its expiry lies
//! strictly in the future.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::DEFAULT_TOKEN_VALIDITY_HOURS;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// How long an issued token stays valid
    pub validity: Duration,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            validity: Duration::hours(DEFAULT_TOKEN_VALIDITY_HOURS),
            issuer: "authgate".to_string(),
        }
    }

    /// Set token validity window
    pub fn validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("validity", &self.validity)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::InvalidSignature,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Get identity ID as UUID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSignature)
    }
}

/// A freshly minted token and its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Validity window of issued tokens
    pub fn validity(&self) -> Duration {
        self.config.validity
    }

    /// Mint a session token for an identity
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.validity)
            .ok_or_else(|| TokenError::Encoding("Token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate and decode a token
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        // jsonwebtoken still accepts exp == now
        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }

    /// Verify a token and return the identity it asserts
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.decode(token)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL_SAFE_ALPHABET: &str =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig::new("test_secret_key_for_testing_only_32bytes!"))
    }

    /// Flip the lowest bit of the first signature character
    fn flip_signature_bit(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let first = signature.chars().next().unwrap();
        let index = URL_SAFE_ALPHABET.find(first).unwrap();
        let flipped = URL_SAFE_ALPHABET.as_bytes()[index ^ 1] as char;

        format!("{}.{}{}", head, flipped, &signature[1..])
    }

    // ========================================================================
    // JwtConfig Tests
    // ========================================================================

    #[test]
    fn test_jwt_config_new() {
        let config = JwtConfig::new("my_secret");

        assert_eq!(config.secret, "my_secret");
        assert_eq!(config.validity, Duration::hours(10));
        assert_eq!(config.issuer, "authgate");
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("secret")
            .validity(Duration::minutes(30))
            .issuer("my_app");

        assert_eq!(config.validity, Duration::minutes(30));
        assert_eq!(config.issuer, "my_app");
    }

    #[test]
    fn test_jwt_config_debug_redacts_secret() {
        let debug = format!("{:?}", JwtConfig::new("super_secret_value"));
        assert!(!debug.contains("super_secret_value"));
    }

    // ========================================================================
    // Issue / Verify
    // ========================================================================

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id).unwrap();

        assert!(!issued.token.is_empty());
        assert_eq!(service.verify(&issued.token).unwrap(), user_id);
    }

    #[test]
    fn test_issued_expiry_matches_window() {
        let service = create_test_service();
        let before = Utc::now();

        let issued = service.issue(Uuid::new_v4()).unwrap();
        let claims = service.decode(&issued.token).unwrap();

        assert_eq!(claims.exp - claims.iat, 10 * 3600);
        assert!(issued.expires_at >= before + Duration::hours(10));
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_expired_token() {
        // Negative validity so the token is already expired when issued
        let config = JwtConfig::new("test_secret").validity(Duration::seconds(-60));
        let service = JwtService::new(config);

        let issued = service.issue(Uuid::new_v4()).unwrap();

        let result = service.verify(&issued.token);
        assert!(
            matches!(result, Err(TokenError::Expired)),
            "Expected Expired error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_token_expiring_this_second_rejected() {
        let service = create_test_service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 60,
            exp: now,
            iss: "authgate".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key_for_testing_only_32bytes!"),
        )
        .unwrap();

        let result = service.verify(&token);
        assert!(
            matches!(result, Err(TokenError::Expired)),
            "Expected Expired error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_unrepresentable_expiry_is_encoding_error() {
        let config = JwtConfig::new("test_secret").validity(Duration::MAX);
        let service = JwtService::new(config);

        let result = service.issue(Uuid::new_v4());
        assert!(matches!(result, Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_single_bit_signature_change_rejected() {
        let service = create_test_service();
        let issued = service.issue(Uuid::new_v4()).unwrap();

        let tampered = flip_signature_bit(&issued.token);
        assert_ne!(tampered, issued.token);

        let result = service.verify(&tampered);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let config = JwtConfig::new("test_secret").validity(Duration::seconds(-60));
        let service = JwtService::new(config);

        let issued = service.issue(Uuid::new_v4()).unwrap();
        let tampered = flip_signature_bit(&issued.token);

        let result = service.verify(&tampered);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service1 = JwtService::new(JwtConfig::new("secret_one"));
        let service2 = JwtService::new(JwtConfig::new("secret_two"));

        let issued = service1.issue(Uuid::new_v4()).unwrap();

        let result = service2.verify(&issued.token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let service1 = JwtService::new(JwtConfig::new("shared").issuer("one"));
        let service2 = JwtService::new(JwtConfig::new("shared").issuer("two"));

        let issued = service1.issue(Uuid::new_v4()).unwrap();

        assert!(service2.verify(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = create_test_service();

        assert!(matches!(
            service.verify("invalid.token.here"),
            Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(
            service.verify(""),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let service = create_test_service();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iss: "authgate".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key_for_testing_only_32bytes!"),
        )
        .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn test_token_error_display() {
        assert_eq!(format!("{}", TokenError::Expired), "Token expired");
        assert_eq!(
            format!("{}", TokenError::InvalidSignature),
            "Invalid token signature"
        );
    }
}
