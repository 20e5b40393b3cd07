//! Storage collaborators for users and sessions

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{SessionStore, UserStore};
