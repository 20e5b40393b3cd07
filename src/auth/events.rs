//! Session lifecycle notifications
//!
//! Observers registered at construction are called synchronously; anything
//! else can `subscribe()` to a broadcast channel. Emission never fails the
//! operation that triggered it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::session::model::Session;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle events emitted by the engine and the registry
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Created(Session),
    Destroyed { session_id: String, user_id: String },
}

impl SessionEvent {
    /// Event name as seen by external observers
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Created(_) => "auth_session_created",
            SessionEvent::Destroyed { .. } => "auth_session_destroyed",
        }
    }
}

type Observer = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

pub struct SessionEvents {
    observers: RwLock<Vec<Observer>>,
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            observers: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Register a handler for every lifecycle event
    pub fn on_event<F>(&self, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let mut observers = match self.observers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        observers.push(Arc::new(handler));
    }

    /// Register a handler for `auth_session_created`
    pub fn on_session_created<F>(&self, handler: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.on_event(move |event| {
            if let SessionEvent::Created(session) = event {
                handler(session);
            }
        });
    }

    /// Receive every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Fire-and-forget delivery to observers and subscribers
    pub fn emit(&self, event: SessionEvent) {
        let observers: Vec<Observer> = match self.observers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                log::error!("Observer panicked while handling {}", event.name());
            }
        }

        // No subscribers is not an error
        if self.sender.send(event).is_err() {
            log::trace!("Session event emitted with no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
