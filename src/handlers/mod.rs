//! HTTP layer for the session API

pub mod error;
pub mod negotiate;
pub mod session;

pub use negotiate::MediaType;
pub use session::{routes, LoginRequest};
