//! Rusty Sessions - bearer session tokens for username/password login
//!
//! This library verifies credentials, mints signed session tokens, persists
//! sessions and authorizes requests that carry them. The `handlers` module
//! exposes the whole flow as a small warp API.

pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod security;
pub mod session;
pub mod storage;
pub mod tls;

// Re-export main components
pub use config::*;
pub use constants::*;
pub use error::{Result, RustySessionsError};
