//! Password hashing capabilities
//!
//! The engine only needs a deterministic `hash(password, salt)`; which
//! algorithm backs it is the deployer's choice. Two implementations ship:
//! iterated SHA-256 and Argon2id with an explicit salt.

use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, RustySessionsError};

/// Salt byte length for generated salts
const SALT_BYTES: usize = 16;

/// Argon2 output length in bytes
const ARGON2_OUTPUT_BYTES: usize = 32;

/// Default number of SHA-256 rounds for password stretching
pub const DEFAULT_SHA256_ITERATIONS: u32 = 100_000;

/// Deterministic password hashing. May be CPU heavy; callers run it off the async executor.
pub trait CredentialHasher: Send + Sync {
    /// Hash a password with the user's salt
    fn hash(&self, password: &str, salt: &str) -> Result<String>;

    /// Hasher name for logging
    fn name(&self) -> &'static str;
}

/// Iterated SHA-256 hasher
pub struct Sha256Hasher {
    iterations: u32,
}

impl Sha256Hasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_SHA256_ITERATIONS)
    }
}

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str, salt: &str) -> Result<String> {
        let mut hash = Sha256::new();
        hash.update(salt.as_bytes());
        hash.update(password.as_bytes());
        let mut result = hash.finalize();

        for _ in 1..self.iterations {
            let mut h = Sha256::new();
            h.update(result);
            h.update(salt.as_bytes());
            result = h.finalize();
        }

        Ok(STANDARD.encode(result))
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Argon2id with default parameters and a caller supplied salt
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str, salt: &str) -> Result<String> {
        let mut output = [0u8; ARGON2_OUTPUT_BYTES];
        self.argon2
            .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut output)
            .map_err(|e| RustySessionsError::HashingError(format!("argon2: {}", e)))?;
        Ok(STANDARD.encode(output))
    }

    fn name(&self) -> &'static str {
        "argon2id"
    }
}

/// Random base64 salt for provisioning accounts
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
