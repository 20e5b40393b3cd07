//! Abstract storage interfaces for pluggable backends
//!
//! The credential store and the session store are collaborators of the
//! session engine. The session store is the only arbiter of write atomicity:
//! it must reject a duplicate token itself rather than rely on callers
//! checking first.

use async_trait::async_trait;

use crate::auth::user::{User, UserCriteria};
use crate::error::Result;
use crate::session::model::{NewSession, Session};

/// Read access to user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user matching every populated criterion
    async fn find_user(&self, criteria: &UserCriteria) -> Result<Option<User>>;
}

/// Session record storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session. Fails with `StorageError` on a duplicate token or unknown owner.
    async fn create_session(&self, session: NewSession) -> Result<Session>;

    /// Exact token match
    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>>;

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Persist changed mutable fields. Fails with `NotFound` when the session is gone.
    async fn update_session(&self, session: Session) -> Result<Session>;

    /// Delete at most one session by token, returning the affected count
    async fn delete_session_by_token(&self, token: &str) -> Result<usize>;

    /// Delete at most one session by id, returning the affected count
    async fn delete_session_by_id(&self, id: &str) -> Result<usize>;
}
