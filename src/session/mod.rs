//! Session records and the ownership-constrained registry

pub mod model;
pub mod registry;

pub use model::{NewSession, Session, SessionPatch, SessionReplacement, SessionView};
pub use registry::{owner_only, SessionConstraints, SessionOperation, SessionRegistry};
