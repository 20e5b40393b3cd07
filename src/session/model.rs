use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::user::PublicUser;
use crate::constants::JWT_PROVIDER;

/// A persisted login. Absent optional fields are left out of serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Bearer token, unique across all sessions
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    /// Issuing provider, "jwt" for every session minted by login
    pub provider: String,
    /// Owner of the session
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a session; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub token: String,
    pub verifier: Option<String>,
    pub provider: String,
    pub user_id: String,
}

impl NewSession {
    /// Session row for a freshly signed JWT
    pub fn jwt(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            verifier: None,
            provider: JWT_PROVIDER.to_string(),
            user_id: user_id.into(),
        }
    }
}

/// Partial update. Only `verifier` may change this way; a body naming any
/// other field is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionPatch {
    #[serde(default)]
    pub verifier: Option<String>,
}

impl SessionPatch {
    pub fn apply(self, session: &mut Session) {
        if let Some(verifier) = self.verifier {
            session.verifier = Some(verifier);
        }
    }
}

/// Full replacement of the mutable fields; token and owner never change
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionReplacement {
    #[serde(default)]
    pub verifier: Option<String>,
    pub provider: String,
}

impl SessionReplacement {
    pub fn apply(self, session: &mut Session) {
        session.verifier = self.verifier;
        session.provider = self.provider;
    }
}

/// A session with its owner populated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}
