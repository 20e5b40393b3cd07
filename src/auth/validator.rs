//! Bearer token validation for protected requests

use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::engine::AuthDependencies;
use crate::auth::token::{extract_bearer_token, Claims, TokenCodec};
use crate::auth::user::{User, UserCriteria};
use crate::config::ServerConfig;
use crate::core::timeout::with_timeout;
use crate::error::{Result, RustySessionsError};
use crate::storage::traits::UserStore;

/// Result of re-checking decoded claims against the credential store
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid(User),
    Rejected,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// `(ok, user)` pair
    pub fn into_parts(self) -> (bool, Option<User>) {
        match self {
            ValidationOutcome::Valid(user) => (true, Some(user)),
            ValidationOutcome::Rejected => (false, None),
        }
    }
}

/// Identity established from a bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user: User,
    pub claims: Claims,
    pub token: String,
}

impl AuthenticatedIdentity {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

pub struct SessionValidator {
    users: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    request_timeout: Duration,
}

impl SessionValidator {
    pub fn new(config: &ServerConfig, deps: &AuthDependencies) -> Self {
        Self {
            users: Arc::clone(&deps.users),
            codec: Arc::clone(&deps.codec),
            request_timeout: config.request_timeout,
        }
    }

    /// Re-fetch the user named by the claims; id, email and username must all
    /// still match. A miss is `Rejected`, a storage failure is an error.
    pub async fn validate(&self, claims: &Claims) -> Result<ValidationOutcome> {
        let criteria = UserCriteria::by_claims(claims);
        let user = with_timeout(self.request_timeout, "token user lookup", self.users.find_user(&criteria)).await?;

        Ok(match user {
            Some(user) => ValidationOutcome::Valid(user),
            None => {
                debug!("Token claims for user {} no longer match a stored user", claims.id);
                ValidationOutcome::Rejected
            }
        })
    }

    /// Full check for a request: `Authorization: Bearer <token>`, signature,
    /// algorithm, then the stored user.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedIdentity> {
        let header = authorization
            .ok_or_else(|| RustySessionsError::TokenMalformed("missing authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| RustySessionsError::TokenMalformed("expected Bearer scheme".to_string()))?;

        if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(RustySessionsError::TokenMalformed("token contains invalid characters".to_string()));
        }

        let claims = self.codec.verify(token)?;

        match self.validate(&claims).await? {
            ValidationOutcome::Valid(user) => Ok(AuthenticatedIdentity {
                user,
                claims,
                token: token.to_string(),
            }),
            ValidationOutcome::Rejected => Err(RustySessionsError::TokenInvalid(
                "token does not match a current user".to_string(),
            )),
        }
    }
}
