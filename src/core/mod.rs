//! Service wiring and request-scoped helpers

pub mod server;
pub mod timeout;

pub use server::{SessionService, SharedSessionService};
pub use timeout::with_timeout;
