//! Integrated service that wires the engine, validator and registry together

use std::sync::Arc;

use crate::auth::engine::{AuthDependencies, AuthEngine};
use crate::auth::events::SessionEvents;
use crate::auth::hasher::CredentialHasher;
use crate::auth::token::TokenCodec;
use crate::auth::validator::SessionValidator;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::session::registry::SessionRegistry;
use crate::storage::memory::MemoryStore;
use crate::storage::traits::{SessionStore, UserStore};

/// Everything the HTTP layer calls into
pub struct SessionService {
    pub engine: AuthEngine,
    pub validator: SessionValidator,
    pub registry: SessionRegistry,
}

impl SessionService {
    pub fn new(config: &ServerConfig, deps: AuthDependencies) -> Self {
        Self {
            validator: SessionValidator::new(config, &deps),
            registry: SessionRegistry::new(config, &deps),
            engine: AuthEngine::new(config, deps),
        }
    }

    /// Build from explicit stores and hasher, deriving the codec from configuration
    pub fn with_stores(
        config: &ServerConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self> {
        let codec = Arc::new(TokenCodec::from_config(config)?);
        Ok(Self::new(config, AuthDependencies::new(users, sessions, hasher, codec)))
    }

    /// Service over a single in-memory store
    pub fn in_memory(
        config: &ServerConfig,
        store: Arc<MemoryStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self> {
        Self::with_stores(config, store.clone(), store, hasher)
    }

    pub fn events(&self) -> &Arc<SessionEvents> {
        self.engine.events()
    }
}

pub type SharedSessionService = Arc<SessionService>;
