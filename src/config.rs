//! Server configuration module
//! Handles the signing secret, token policy and timing parameters for the session service

use crate::auth::user::IdentifierField;
use crate::constants::{
    DEFAULT_HOST, DEFAULT_MIN_AUTH_DURATION_MS, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::error::{Result, RustySessionsError};
use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret for token signing/verification
    pub jwt_secret: String,
    /// Algorithm used when minting new tokens
    pub signing_algorithm: Algorithm,
    /// Algorithms a presented token may declare
    pub accepted_algorithms: Vec<Algorithm>,
    /// User attributes that may be used to look up an account at login
    pub identifier_fields: Vec<IdentifierField>,
    /// Token lifetime. None means tokens carry no `exp` claim
    pub token_ttl: Option<Duration>,
    /// Upper bound for each storage or hashing call
    pub request_timeout: Duration,
    /// Failed logins never answer faster than this
    pub min_auth_duration: Duration,
    /// Development mode (relaxes secret strength checks)
    pub development_mode: bool,
    /// Optional JSON file of users loaded into the memory store at startup
    pub users_file: Option<String>,
    /// TLS configuration
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    /// Enable TLS
    pub enable_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

impl ServerConfig {
    /// Build a configuration around an explicit secret with the minimal default policy:
    /// HS256 only, lookup by email, no expiry.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: jwt_secret.into(),
            signing_algorithm: Algorithm::HS256,
            accepted_algorithms: vec![Algorithm::HS256],
            identifier_fields: vec![IdentifierField::Email],
            token_ttl: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            min_auth_duration: Duration::from_millis(DEFAULT_MIN_AUTH_DURATION_MS),
            development_mode: false,
            users_file: None,
            tls_cert_path: None,
            tls_key_path: None,
            enable_tls: false,
        }
    }

    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self::new("test-jwt-secret-only-for-unit-tests-never-use-in-production")
            .with_min_auth_duration(Duration::ZERO)
    }

    pub fn with_algorithms(mut self, signing: Algorithm, accepted: Vec<Algorithm>) -> Self {
        self.signing_algorithm = signing;
        self.accepted_algorithms = accepted;
        self
    }

    pub fn with_identifier_fields(mut self, fields: Vec<IdentifierField>) -> Self {
        self.identifier_fields = fields;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = Some(ttl);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_min_auth_duration(mut self, duration: Duration) -> Self {
        self.min_auth_duration = duration;
        self
    }

    /// Check the token policy is usable with a shared secret
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(RustySessionsError::ConfigError("JWT secret must not be empty".to_string()));
        }

        if self.accepted_algorithms.is_empty() {
            return Err(RustySessionsError::ConfigError(
                "At least one accepted algorithm is required".to_string(),
            ));
        }

        for alg in self.accepted_algorithms.iter().chain(std::iter::once(&self.signing_algorithm)) {
            if !is_hmac(*alg) {
                return Err(RustySessionsError::ConfigError(format!(
                    "Algorithm {:?} cannot be used with a shared secret (use HS256, HS384 or HS512)",
                    alg
                )));
            }
        }

        if !self.accepted_algorithms.contains(&self.signing_algorithm) {
            return Err(RustySessionsError::ConfigError(format!(
                "Signing algorithm {:?} must also be in the accepted list",
                self.signing_algorithm
            )));
        }

        if self.identifier_fields.is_empty() {
            return Err(RustySessionsError::ConfigError(
                "At least one identifier field is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(RustySessionsError::ConfigError(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(RustySessionsError::ConfigError(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RustySessionsError::ConfigError(
                "JWT secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("RUSTY_SESSIONS_JWT_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .map_err(|_| {
                RustySessionsError::ConfigError(
                    "JWT_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let mut config = Self::new(jwt_secret);

        config.host = env::var("RUSTY_SESSIONS_HOST").unwrap_or(DEFAULT_HOST.to_string());
        config.port = env::var("RUSTY_SESSIONS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        if let Ok(alg) = env::var("RUSTY_SESSIONS_JWT_ALGORITHM") {
            config.signing_algorithm = parse_algorithm(&alg)?;
        }

        config.accepted_algorithms = match env::var("RUSTY_SESSIONS_JWT_ALGORITHMS") {
            Ok(list) => parse_list(&list, parse_algorithm)?,
            Err(_) => vec![config.signing_algorithm],
        };

        if let Ok(list) = env::var("RUSTY_SESSIONS_IDENTIFIER_FIELDS") {
            config.identifier_fields = parse_list(&list, |s| IdentifierField::from_str(s))?;
        }

        config.token_ttl = env::var("RUSTY_SESSIONS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs);

        let timeout_ms = env::var("RUSTY_SESSIONS_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        config.request_timeout = Duration::from_millis(timeout_ms);

        let min_auth_ms = env::var("RUSTY_SESSIONS_MIN_AUTH_MS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_MIN_AUTH_DURATION_MS);
        config.min_auth_duration = Duration::from_millis(min_auth_ms);

        config.development_mode = env_flag("RUSTY_SESSIONS_DEVELOPMENT_MODE");
        config.users_file = env::var("RUSTY_SESSIONS_USERS_FILE").ok();

        // TLS configuration
        config.enable_tls = env_flag("RUSTY_SESSIONS_ENABLE_TLS");
        config.tls_cert_path = env::var("RUSTY_SESSIONS_TLS_CERT_PATH").ok();
        config.tls_key_path = env::var("RUSTY_SESSIONS_TLS_KEY_PATH").ok();

        if config.enable_tls && (config.tls_cert_path.is_none() || config.tls_key_path.is_none()) {
            return Err(RustySessionsError::ConfigError(
                "TLS is enabled but RUSTY_SESSIONS_TLS_CERT_PATH or RUSTY_SESSIONS_TLS_KEY_PATH is not set".to_string(),
            ));
        }

        if config.development_mode {
            log::warn!("Development mode: JWT secret strength checks are skipped");
        } else {
            Self::validate_secret(&config.jwt_secret)?;
        }

        config.validate()?;

        Ok(config)
    }
}

/// HMAC family check; only these work with a shared secret
pub fn is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn parse_algorithm(value: &str) -> Result<Algorithm> {
    Algorithm::from_str(value.trim())
        .map_err(|_| RustySessionsError::ConfigError(format!("Unknown JWT algorithm '{}'", value.trim())))
}

fn parse_list<T>(value: &str, parse: impl Fn(&str) -> Result<T>) -> Result<Vec<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse)
        .collect()
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}
