//! Authentication: credential checks, token codec and request validation

pub mod engine;
pub mod events;
pub mod hasher;
pub mod token;
pub mod user;
pub mod validator;

// Re-export main components
pub use engine::{AuthDependencies, AuthEngine};
pub use events::{SessionEvent, SessionEvents};
pub use hasher::{Argon2Hasher, CredentialHasher, Sha256Hasher};
pub use token::{Claims, TokenCodec};
pub use user::{IdentifierField, PublicUser, User, UserCriteria};
pub use validator::{AuthenticatedIdentity, SessionValidator, ValidationOutcome};
