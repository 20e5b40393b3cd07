//! In-memory storage implementation for development and testing
//!
//! One store holds both users and sessions so it can enforce the session
//! owner reference and the unique-token constraint under a single lock.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::{SessionStore, UserStore};
use crate::auth::user::{User, UserCriteria};
use crate::error::{Result, RustySessionsError};
use crate::session::model::{NewSession, Session};

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, Session>,
    // token -> session id
    by_token: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<SessionTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, failing when the id, email or username is already taken
    pub async fn insert_user(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        let taken = users.values().any(|existing| {
            existing.id == user.id || existing.email == user.email || existing.username == user.username
        });
        if taken {
            return Err(RustySessionsError::StorageError(format!(
                "User {} conflicts with an existing account",
                user.id
            )));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Replace a stored user, as an external registration flow would
    pub async fn update_user(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(RustySessionsError::NotFound(format!("user {}", user.id))),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, criteria: &UserCriteria) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| criteria.matches(user)).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, new_session: NewSession) -> Result<Session> {
        if !self.users.read().await.contains_key(&new_session.user_id) {
            return Err(RustySessionsError::StorageError(format!(
                "Session owner {} does not exist",
                new_session.user_id
            )));
        }

        let mut table = self.sessions.write().await;
        if table.by_token.contains_key(&new_session.token) {
            return Err(RustySessionsError::StorageError(
                "Unique constraint violated: session token already exists".to_string(),
            ));
        }

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            token: new_session.token,
            verifier: new_session.verifier,
            provider: new_session.provider,
            user_id: new_session.user_id,
            created_at: Utc::now(),
        };

        table.by_token.insert(session.token.clone(), session.id.clone());
        table.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        let table = self.sessions.read().await;
        Ok(table
            .by_token
            .get(token)
            .and_then(|id| table.sessions.get(id))
            .cloned())
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.sessions.get(id).cloned())
    }

    async fn update_session(&self, session: Session) -> Result<Session> {
        let mut table = self.sessions.write().await;
        match table.sessions.get_mut(&session.id) {
            Some(existing) => {
                // token, owner and creation time are immutable
                existing.verifier = session.verifier;
                existing.provider = session.provider;
                Ok(existing.clone())
            }
            None => Err(RustySessionsError::NotFound(format!("session {}", session.id))),
        }
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<usize> {
        let mut table = self.sessions.write().await;
        match table.by_token.remove(token) {
            Some(id) => Ok(table.sessions.remove(&id).map_or(0, |_| 1)),
            None => Ok(0),
        }
    }

    async fn delete_session_by_id(&self, id: &str) -> Result<usize> {
        let mut table = self.sessions.write().await;
        match table.sessions.remove(id) {
            Some(session) => {
                table.by_token.remove(&session.token);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
