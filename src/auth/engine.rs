//! Login orchestration: credential check, token minting, session persistence

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::events::{SessionEvent, SessionEvents};
use crate::auth::hasher::CredentialHasher;
use crate::auth::token::{Claims, TokenCodec};
use crate::auth::user::{IdentifierField, User, UserCriteria};
use crate::config::ServerConfig;
use crate::core::timeout::with_timeout;
use crate::error::{Result, RustySessionsError};
use crate::security::{constant_time_eq, AuthTimer};
use crate::session::model::{NewSession, Session};
use crate::storage::traits::{SessionStore, UserStore};

/// Salt hashed against when the identifier matches no account
const ABSENT_USER_SALT: &str = "rusty-sessions/absent-user";

/// Collaborators shared by the engine, the validator and the registry
#[derive(Clone)]
pub struct AuthDependencies {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub codec: Arc<TokenCodec>,
    pub events: Arc<SessionEvents>,
}

impl AuthDependencies {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            codec,
            events: Arc::new(SessionEvents::new()),
        }
    }

    pub fn with_events(mut self, events: Arc<SessionEvents>) -> Self {
        self.events = events;
        self
    }
}

pub struct AuthEngine {
    deps: AuthDependencies,
    identifier_fields: Vec<IdentifierField>,
    request_timeout: Duration,
    min_auth_duration: Duration,
}

impl AuthEngine {
    pub fn new(config: &ServerConfig, deps: AuthDependencies) -> Self {
        Self {
            deps,
            identifier_fields: config.identifier_fields.clone(),
            request_timeout: config.request_timeout,
            min_auth_duration: config.min_auth_duration,
        }
    }

    /// Identifier fields accepted by `login`, in configured order
    pub fn identifier_fields(&self) -> &[IdentifierField] {
        &self.identifier_fields
    }

    pub fn events(&self) -> &Arc<SessionEvents> {
        &self.deps.events
    }

    /// Authenticate with an identifier and password, returning a new session.
    ///
    /// Unknown identifiers and wrong passwords both fail with
    /// `InvalidCredentials` after the same minimum delay.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        identifier_field: IdentifierField,
    ) -> Result<Session> {
        let timer = AuthTimer::new(self.min_auth_duration);

        if identifier.trim().is_empty() || password.is_empty() {
            return Err(RustySessionsError::ValidationError(
                "identifier and password are required".to_string(),
            ));
        }

        if !self.identifier_fields.contains(&identifier_field) {
            return Err(RustySessionsError::ValidationError(format!(
                "'{}' is not a configured identifier field",
                identifier_field
            )));
        }

        let user = match self.verify_credentials(identifier, password, identifier_field).await {
            Ok(user) => user,
            Err(RustySessionsError::InvalidCredentials) => {
                warn!("Login failed for {} lookup", identifier_field);
                timer.wait().await;
                return Err(RustySessionsError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let token = self.deps.codec.sign(&Claims::for_user(&user))?;
        let session = self.persist_session(NewSession::jwt(user.id.clone(), token)).await?;

        self.deps.events.emit(SessionEvent::Created(session.clone()));
        info!("Session {} created for user {}", session.id, session.user_id);

        Ok(session)
    }

    async fn verify_credentials(
        &self,
        identifier: &str,
        password: &str,
        identifier_field: IdentifierField,
    ) -> Result<User> {
        let criteria = UserCriteria::by_identifier(identifier_field, identifier);
        let user = match with_timeout(self.request_timeout, "user lookup", self.deps.users.find_user(&criteria))
            .await?
        {
            Some(user) => user,
            None => {
                // Pay for a hash anyway so a missing account costs as much as a wrong password
                self.hash_password(password, ABSENT_USER_SALT).await?;
                return Err(RustySessionsError::InvalidCredentials);
            }
        };

        let digest = self.hash_password(password, &user.salt).await?;
        if !constant_time_eq(&digest, &user.password_digest) {
            debug!("Password digest mismatch for user {}", user.id);
            return Err(RustySessionsError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Hash on the blocking pool so request handling keeps going
    async fn hash_password(&self, password: &str, salt: &str) -> Result<String> {
        let hasher = Arc::clone(&self.deps.hasher);
        let password = password.to_string();
        let salt = salt.to_string();

        with_timeout(self.request_timeout, "password hashing", async move {
            tokio::task::spawn_blocking(move || hasher.hash(&password, &salt)).await?
        })
        .await
    }

    /// The write runs in its own task: a timeout stops the wait, never the write,
    /// so a slow but successful insert still lands exactly once.
    async fn persist_session(&self, new_session: NewSession) -> Result<Session> {
        let sessions = Arc::clone(&self.deps.sessions);
        let write = tokio::spawn(async move { sessions.create_session(new_session).await });

        with_timeout(self.request_timeout, "session creation", async move { write.await? }).await
    }
}
