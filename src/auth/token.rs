use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::auth::user::User;
use crate::config::{is_hmac, ServerConfig};
use crate::constants::{BEARER_PREFIX, MAX_TOKEN_LENGTH};
use crate::error::{Result, RustySessionsError};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: String,
    pub email: String,
    pub username: String,
    /// Issued at (as UTC timestamp)
    pub iat: u64,
    /// Token nonce, keeps two logins within the same second from minting the same token
    pub jti: String,
    /// Expiration time, only present when a token TTL is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    /// Creates new claims for a user
    pub fn new(id: String, email: String, username: String) -> Self {
        Self {
            id,
            email,
            username,
            iat: now_secs(),
            jti: uuid::Uuid::new_v4().to_string(),
            exp: None,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id.clone(), user.email.clone(), user.username.clone())
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Signs and verifies session tokens with a shared secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    signing_algorithm: Algorithm,
    accepted_algorithms: Vec<Algorithm>,
    ttl: Option<Duration>,
}

impl TokenCodec {
    /// Creates a codec with a secret, a signing algorithm and the set of algorithms
    /// a presented token may declare
    pub fn new(
        secret: &str,
        signing_algorithm: Algorithm,
        accepted_algorithms: Vec<Algorithm>,
        ttl: Option<Duration>,
    ) -> Result<Self> {
        if !is_hmac(signing_algorithm) || accepted_algorithms.iter().any(|alg| !is_hmac(*alg)) {
            return Err(RustySessionsError::ConfigError(
                "Only HMAC algorithms can be used with a shared secret".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            signing_algorithm,
            accepted_algorithms,
            ttl,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            &config.jwt_secret,
            config.signing_algorithm,
            config.accepted_algorithms.clone(),
            config.token_ttl,
        )
    }

    pub fn accepted_algorithms(&self) -> &[Algorithm] {
        &self.accepted_algorithms
    }

    /// Signs the claims, stamping `exp` when a TTL is configured
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let mut claims = claims.clone();
        if let Some(ttl) = self.ttl {
            claims.exp = Some(claims.iat + ttl.as_secs());
        }

        encode(&Header::new(self.signing_algorithm), &claims, &self.encoding_key)
            .map_err(|e| RustySessionsError::SystemError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token and returns its claims.
    ///
    /// The declared algorithm is checked against the accepted set before any
    /// signature work, so a token re-signed under another algorithm is refused
    /// even when its signature would verify.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(RustySessionsError::TokenMalformed("token too long".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| RustySessionsError::TokenMalformed(e.to_string()))?;

        if !self.accepted_algorithms.contains(&header.alg) {
            return Err(RustySessionsError::AlgorithmRejected(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.accepted_algorithms.clone();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = self.ttl.is_some();
        if self.ttl.is_some() {
            validation.required_spec_claims.insert("exp".to_string());
        }

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => {
                    RustySessionsError::TokenInvalid("signature mismatch".to_string())
                }
                ErrorKind::ExpiredSignature => RustySessionsError::TokenInvalid("token expired".to_string()),
                ErrorKind::InvalidAlgorithm => {
                    RustySessionsError::AlgorithmRejected(format!("{:?}", header.alg))
                }
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => RustySessionsError::TokenMalformed(e.to_string()),
                _ => RustySessionsError::TokenInvalid(e.to_string()),
            })
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let auth_header = auth_header.trim();
    let has_prefix = auth_header
        .as_bytes()
        .get(..BEARER_PREFIX.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX.as_bytes()));

    if !has_prefix {
        return None;
    }

    // The prefix is ASCII, so the byte after it starts a character
    match auth_header.get(BEARER_PREFIX.len()..).map(str::trim) {
        Some(token) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Strips an optional "Bearer " prefix, leaving bare tokens untouched
pub fn strip_bearer(value: &str) -> &str {
    extract_bearer_token(value).unwrap_or_else(|| value.trim())
}
