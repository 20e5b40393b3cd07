//! Session lookup, deletion and the ownership constraint
//!
//! Every get/patch/put/delete that addresses a session record goes through
//! `SessionRegistry::authorize`, which evaluates the constraint configured
//! for that operation. By default all four use `owner_only`.

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::engine::AuthDependencies;
use crate::auth::events::{SessionEvent, SessionEvents};
use crate::auth::token::strip_bearer;
use crate::auth::user::UserCriteria;
use crate::config::ServerConfig;
use crate::core::timeout::with_timeout;
use crate::error::{Result, RustySessionsError};
use crate::session::model::{Session, SessionPatch, SessionReplacement, SessionView};
use crate::storage::traits::{SessionStore, UserStore};

/// Operations subject to the ownership constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOperation {
    Get,
    Patch,
    Put,
    Delete,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionOperation::Get => "get",
            SessionOperation::Patch => "patch",
            SessionOperation::Put => "put",
            SessionOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// `(session, authenticated_user_id) -> allowed`
pub type OwnershipPredicate = fn(&Session, &str) -> bool;

/// Only the user who owns the session may touch it
pub fn owner_only(session: &Session, authenticated_user_id: &str) -> bool {
    !authenticated_user_id.is_empty() && session.user_id == authenticated_user_id
}

/// Constraint per operation
#[derive(Clone, Copy)]
pub struct SessionConstraints {
    pub get: OwnershipPredicate,
    pub patch: OwnershipPredicate,
    pub put: OwnershipPredicate,
    pub delete: OwnershipPredicate,
}

impl SessionConstraints {
    pub fn for_operation(&self, operation: SessionOperation) -> OwnershipPredicate {
        match operation {
            SessionOperation::Get => self.get,
            SessionOperation::Patch => self.patch,
            SessionOperation::Put => self.put,
            SessionOperation::Delete => self.delete,
        }
    }
}

impl Default for SessionConstraints {
    fn default() -> Self {
        Self {
            get: owner_only,
            patch: owner_only,
            put: owner_only,
            delete: owner_only,
        }
    }
}

pub struct SessionRegistry {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    events: Arc<SessionEvents>,
    constraints: SessionConstraints,
    request_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(config: &ServerConfig, deps: &AuthDependencies) -> Self {
        Self {
            users: Arc::clone(&deps.users),
            sessions: Arc::clone(&deps.sessions),
            events: Arc::clone(&deps.events),
            constraints: SessionConstraints::default(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn with_constraints(mut self, constraints: SessionConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Apply the configured constraint for `operation`
    pub fn authorize(
        &self,
        operation: SessionOperation,
        session: &Session,
        authenticated_user_id: &str,
    ) -> Result<()> {
        let allowed = self.constraints.for_operation(operation);
        if allowed(session, authenticated_user_id) {
            Ok(())
        } else {
            warn!(
                "User {} denied {} on session {}",
                authenticated_user_id, operation, session.id
            );
            Err(RustySessionsError::Forbidden)
        }
    }

    /// Session for a token (optionally prefixed with "Bearer "), with its owner populated
    pub async fn get_session(&self, token: &str) -> Result<SessionView> {
        let session = self
            .find_by_token(strip_bearer(token))
            .await?
            .ok_or_else(|| RustySessionsError::NotFound("session".to_string()))?;
        self.populate(session).await
    }

    /// Delete the session for a token. Unknown tokens affect zero rows.
    pub async fn delete_session(&self, token: &str) -> Result<usize> {
        let token = strip_bearer(token);
        let existing = self.find_by_token(token).await?;

        let deleted = with_timeout(
            self.request_timeout,
            "session deletion",
            self.sessions.delete_session_by_token(token),
        )
        .await?;

        if let (Some(session), true) = (existing, deleted > 0) {
            self.destroyed(&session);
        }
        Ok(deleted)
    }

    pub async fn get_owned(&self, id: &str, authenticated_user_id: &str) -> Result<SessionView> {
        let session = self.require_by_id(id).await?;
        self.authorize(SessionOperation::Get, &session, authenticated_user_id)?;
        self.populate(session).await
    }

    pub async fn patch_owned(
        &self,
        id: &str,
        authenticated_user_id: &str,
        patch: SessionPatch,
    ) -> Result<Session> {
        let mut session = self.require_by_id(id).await?;
        self.authorize(SessionOperation::Patch, &session, authenticated_user_id)?;
        patch.apply(&mut session);
        self.update(session).await
    }

    pub async fn put_owned(
        &self,
        id: &str,
        authenticated_user_id: &str,
        replacement: SessionReplacement,
    ) -> Result<Session> {
        let mut session = self.require_by_id(id).await?;
        self.authorize(SessionOperation::Put, &session, authenticated_user_id)?;
        replacement.apply(&mut session);
        self.update(session).await
    }

    /// Idempotent: a missing session affects zero rows; someone else's is `Forbidden`
    pub async fn delete_owned(&self, id: &str, authenticated_user_id: &str) -> Result<usize> {
        let session = match self.find_by_id(id).await? {
            Some(session) => session,
            None => return Ok(0),
        };
        self.authorize(SessionOperation::Delete, &session, authenticated_user_id)?;

        let deleted = with_timeout(
            self.request_timeout,
            "session deletion",
            self.sessions.delete_session_by_id(id),
        )
        .await?;

        if deleted > 0 {
            self.destroyed(&session);
        }
        Ok(deleted)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>> {
        with_timeout(
            self.request_timeout,
            "session lookup",
            self.sessions.find_session_by_token(token),
        )
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        with_timeout(self.request_timeout, "session lookup", self.sessions.find_session_by_id(id)).await
    }

    async fn require_by_id(&self, id: &str) -> Result<Session> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RustySessionsError::NotFound(format!("session {}", id)))
    }

    async fn update(&self, session: Session) -> Result<Session> {
        let updated = with_timeout(
            self.request_timeout,
            "session update",
            self.sessions.update_session(session),
        )
        .await?;
        debug!("Session {} updated", updated.id);
        Ok(updated)
    }

    async fn populate(&self, session: Session) -> Result<SessionView> {
        let owner = with_timeout(
            self.request_timeout,
            "session owner lookup",
            self.users.find_user(&UserCriteria::by_id(&session.user_id)),
        )
        .await?;

        Ok(SessionView {
            user: owner.map(|user| user.public()),
            session,
        })
    }

    fn destroyed(&self, session: &Session) {
        info!("Session {} destroyed for user {}", session.id, session.user_id);
        self.events.emit(SessionEvent::Destroyed {
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
        });
    }
}
