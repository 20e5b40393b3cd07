use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::token::Claims;
use crate::error::RustySessionsError;

/// User attributes that can identify an account at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierField {
    Email,
    Username,
}

impl IdentifierField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierField::Email => "email",
            IdentifierField::Username => "username",
        }
    }
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierField {
    type Err = RustySessionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(IdentifierField::Email),
            "username" => Ok(IdentifierField::Username),
            other => Err(RustySessionsError::ValidationError(format!(
                "Unknown identifier field '{}'",
                other
            ))),
        }
    }
}

/// A stored account, including its credential material
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user identifier
    pub id: String,
    pub email: String,
    pub username: String,
    /// Output of the configured hasher for (password, salt)
    pub password_digest: String,
    pub salt: String,
    /// Accounts still waiting for a password cannot log in
    pub requires_password: bool,
    /// Account creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Creates a user that can log in with the given credential material
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        password_digest: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            password_digest: password_digest.into(),
            salt: salt.into(),
            requires_password: false,
            created_at: chrono::Utc::now(),
        }
    }

    /// Value of the given identifier attribute
    pub fn identifier(&self, field: IdentifierField) -> &str {
        match field {
            IdentifierField::Email => &self.email,
            IdentifierField::Username => &self.username,
        }
    }

    /// View safe to serialize into responses
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

/// User as exposed over the wire: never carries digest or salt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lookup criteria for the credential store. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCriteria {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub requires_password: Option<bool>,
}

impl UserCriteria {
    /// Login lookup: `{field: value, requires_password: false}`
    pub fn by_identifier(field: IdentifierField, value: &str) -> Self {
        let mut criteria = Self {
            requires_password: Some(false),
            ..Self::default()
        };
        match field {
            IdentifierField::Email => criteria.email = Some(value.to_string()),
            IdentifierField::Username => criteria.username = Some(value.to_string()),
        }
        criteria
    }

    /// Token re-validation lookup: id, email and username all at once
    pub fn by_claims(claims: &Claims) -> Self {
        Self {
            id: Some(claims.id.clone()),
            email: Some(claims.email.clone()),
            username: Some(claims.username.clone()),
            requires_password: None,
        }
    }

    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// Check a user against every populated field
    pub fn matches(&self, user: &User) -> bool {
        self.id.as_ref().map_or(true, |id| *id == user.id)
            && self.email.as_ref().map_or(true, |email| *email == user.email)
            && self.username.as_ref().map_or(true, |name| *name == user.username)
            && self
                .requires_password
                .map_or(true, |required| required == user.requires_password)
    }
}
