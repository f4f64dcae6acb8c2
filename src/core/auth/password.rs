//! Password hashing
//!
//! bcrypt with a fresh random salt per hash. The async entry points run the
//! hash on tokio's blocking pool so request handling is never stalled by the
//! work factor.
//!
//! bcrypt only reads the first 72 bytes of its input, so longer passwords are
//! refused instead of being silently truncated.

/// Longest accepted password, in bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Password must be at most {MAX_PASSWORD_BYTES} bytes long")]
    TooLong,
}

fn check_length(password: &str) -> Result<(), PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

impl From<bcrypt::BcryptError> for PasswordError {
    fn from(err: bcrypt::BcryptError) -> Self {
        PasswordError::Hashing(err.to_string())
    }
}

/// Salted one-way password hasher
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost factor
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// The configured cost factor
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the current thread
    pub fn hash_blocking(&self, password: &str) -> Result<String, PasswordError> {
        check_length(password)?;
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Verify on the current thread. A mismatch is `Ok(false)`.
    pub fn verify_blocking(password: &str, hash: &str) -> Result<bool, PasswordError> {
        check_length(password)?;
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Hash a password on the blocking pool
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let hasher = *self;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|e| PasswordError::Hashing(format!("Task join error: {}", e)))?
    }

    /// Verify a password against a stored hash on the blocking pool
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &hash))
            .await
            .map_err(|e| PasswordError::Hashing(format!("Task join error: {}", e)))?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_BCRYPT_COST)
    }
}
