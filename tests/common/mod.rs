#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rusty_sessions::auth::hasher::{CredentialHasher, Sha256Hasher};
use rusty_sessions::auth::user::User;
use rusty_sessions::config::ServerConfig;
use rusty_sessions::core::SessionService;
use rusty_sessions::storage::MemoryStore;

pub const SECRET: &str = "5e6r7t68yp9uhvycrd67890ijbhvgucftrd6y5789";
pub const SALT: &str = "S";
pub const PASSWORD: &str = "password";

pub fn config() -> ServerConfig {
    ServerConfig::new(SECRET).with_min_auth_duration(Duration::ZERO)
}

pub fn hasher() -> Arc<dyn CredentialHasher> {
    Arc::new(Sha256Hasher::new(10))
}

pub fn user(id: &str, email: &str, username: &str) -> User {
    let digest = Sha256Hasher::new(10).hash(PASSWORD, SALT).unwrap();
    User::new(id, email, username, digest, SALT)
}

/// Store with two accounts sharing the same password
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_user(user("1", "hello@newworld.codes", "multicolour"))
        .await
        .unwrap();
    store
        .insert_user(user("2", "other@newworld.codes", "someone"))
        .await
        .unwrap();
    store
}

pub async fn service_with(config: ServerConfig) -> (Arc<SessionService>, Arc<MemoryStore>) {
    let store = seeded_store().await;
    let service = SessionService::in_memory(&config, store.clone(), hasher()).unwrap();
    (Arc::new(service), store)
}

pub async fn service() -> (Arc<SessionService>, Arc<MemoryStore>) {
    service_with(config()).await
}
