mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rusty_sessions::auth::events::SessionEvent;
use rusty_sessions::auth::hasher::{CredentialHasher, Sha256Hasher};
use rusty_sessions::auth::user::{IdentifierField, User, UserCriteria};
use rusty_sessions::core::SessionService;
use rusty_sessions::error::{Result, RustySessionsError};
use rusty_sessions::session::model::{NewSession, Session};
use rusty_sessions::storage::{MemoryStore, SessionStore, UserStore};

use common::{config, hasher, seeded_store, service, service_with, PASSWORD};

#[tokio::test]
async fn test_login_creates_jwt_session() {
    let (service, store) = service().await;

    let session = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await
        .unwrap();

    assert_eq!(session.user_id, "1");
    assert_eq!(session.provider, "jwt");
    assert!(session.verifier.is_none());
    assert_eq!(session.token.split('.').count(), 3);
    assert_eq!(store.session_count().await, 1);

    // The token decodes to the user's identity claims
    let identity = service
        .validator
        .authenticate(Some(format!("Bearer {}", session.token).as_str()))
        .await
        .unwrap();
    assert_eq!(identity.user_id(), "1");
    assert_eq!(identity.claims.email, "hello@newworld.codes");
    assert_eq!(identity.claims.username, "multicolour");
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_fail_identically() {
    let (service, store) = service().await;

    let wrong_password = service
        .engine
        .login("hello@newworld.codes", "not-the-password", IdentifierField::Email)
        .await
        .unwrap_err();
    let unknown_user = service
        .engine
        .login("nobody@newworld.codes", PASSWORD, IdentifierField::Email)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, RustySessionsError::InvalidCredentials));
    assert!(matches!(unknown_user, RustySessionsError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), "Invalid login.");
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_failed_login_waits_minimum_duration() {
    let (service, _store) = service_with(config().with_min_auth_duration(Duration::from_millis(50))).await;

    let started = std::time::Instant::now();
    let result = service
        .engine
        .login("nobody@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;

    assert!(result.is_err());
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_account_awaiting_password_cannot_log_in() {
    let (service, store) = service().await;

    let mut pending: User = store
        .find_user(&UserCriteria::by_id("2"))
        .await
        .unwrap()
        .unwrap();
    pending.requires_password = true;
    store.update_user(pending).await.unwrap();

    let result = service
        .engine
        .login("other@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;
    assert!(matches!(result, Err(RustySessionsError::InvalidCredentials)));
}

#[tokio::test]
async fn test_each_login_gets_its_own_session() {
    let (service, store) = service().await;

    let first = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await
        .unwrap();
    let second = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.token, second.token);
    assert_eq!(store.session_count().await, 2);
}

#[tokio::test]
async fn test_identifier_field_must_be_configured() {
    let (service, _store) = service().await;

    let result = service
        .engine
        .login("multicolour", PASSWORD, IdentifierField::Username)
        .await;
    assert!(matches!(result, Err(RustySessionsError::ValidationError(_))));
}

#[tokio::test]
async fn test_username_login_when_configured() {
    let config = config().with_identifier_fields(vec![IdentifierField::Email, IdentifierField::Username]);
    let (service, _store) = service_with(config).await;

    assert_eq!(service.engine.identifier_fields().len(), 2);
    let session = service
        .engine
        .login("multicolour", PASSWORD, IdentifierField::Username)
        .await
        .unwrap();
    assert_eq!(session.user_id, "1");
}

#[tokio::test]
async fn test_empty_inputs_rejected() {
    let (service, _store) = service().await;

    let no_identifier = service.engine.login("  ", PASSWORD, IdentifierField::Email).await;
    let no_password = service
        .engine
        .login("hello@newworld.codes", "", IdentifierField::Email)
        .await;

    assert!(matches!(no_identifier, Err(RustySessionsError::ValidationError(_))));
    assert!(matches!(no_password, Err(RustySessionsError::ValidationError(_))));
}

#[tokio::test]
async fn test_session_created_event_fires() {
    let (service, _store) = service().await;
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    service.events().on_session_created(move |session| {
        assert_eq!(session.user_id, "1");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let mut receiver = service.events().subscribe();

    let session = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    match receiver.recv().await.unwrap() {
        SessionEvent::Created(created) => assert_eq!(created.id, session.id),
        other => panic!("unexpected event {}", other.name()),
    }
}

#[tokio::test]
async fn test_failed_login_emits_nothing() {
    let (service, _store) = service().await;
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    service.events().on_event(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let _ = service
        .engine
        .login("hello@newworld.codes", "wrong", IdentifierField::Email)
        .await;
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

struct BrokenUserStore;

#[async_trait]
impl UserStore for BrokenUserStore {
    async fn find_user(&self, _criteria: &UserCriteria) -> Result<Option<User>> {
        Err(RustySessionsError::StorageError("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failure_is_not_invalid_credentials() {
    let sessions = Arc::new(MemoryStore::new());
    let service = SessionService::with_stores(&config(), Arc::new(BrokenUserStore), sessions, hasher()).unwrap();

    let result = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;
    assert!(matches!(result, Err(RustySessionsError::StorageError(_))));
}

/// Session store whose writes succeed, but slowly
struct SlowSessionStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

#[async_trait]
impl SessionStore for SlowSessionStore {
    async fn create_session(&self, new_session: NewSession) -> Result<Session> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_session(new_session).await
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        self.inner.find_session_by_token(token).await
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>> {
        self.inner.find_session_by_id(id).await
    }

    async fn update_session(&self, session: Session) -> Result<Session> {
        self.inner.update_session(session).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<usize> {
        self.inner.delete_session_by_token(token).await
    }

    async fn delete_session_by_id(&self, id: &str) -> Result<usize> {
        self.inner.delete_session_by_id(id).await
    }
}

#[tokio::test]
async fn test_slow_session_write_times_out_but_lands_once() {
    let store = seeded_store().await;
    let sessions = Arc::new(SlowSessionStore {
        inner: store.clone(),
        delay: Duration::from_millis(300),
    });
    let config = config().with_request_timeout(Duration::from_millis(100));
    let service = SessionService::with_stores(&config, store.clone(), sessions, hasher()).unwrap();

    let result = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;
    assert!(matches!(result, Err(RustySessionsError::Timeout(_))));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.session_count().await, 1);
}

/// Session store that refuses every write
struct FailingSessionStore {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn create_session(&self, _new_session: NewSession) -> Result<Session> {
        Err(RustySessionsError::StorageError("disk full".to_string()))
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>> {
        self.inner.find_session_by_token(token).await
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>> {
        self.inner.find_session_by_id(id).await
    }

    async fn update_session(&self, session: Session) -> Result<Session> {
        self.inner.update_session(session).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<usize> {
        self.inner.delete_session_by_token(token).await
    }

    async fn delete_session_by_id(&self, id: &str) -> Result<usize> {
        self.inner.delete_session_by_id(id).await
    }
}

#[tokio::test]
async fn test_failed_session_write_is_storage_error_without_event() {
    let store = seeded_store().await;
    let sessions = Arc::new(FailingSessionStore { inner: store.clone() });
    let service = SessionService::with_stores(&config(), store.clone(), sessions, hasher()).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    service.events().on_event(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result = service
        .engine
        .login("hello@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;

    assert!(matches!(result, Err(RustySessionsError::StorageError(_))));
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(store.session_count().await, 0);
}

/// Counts hash calls on top of the fixture hasher
struct CountingHasher {
    inner: Sha256Hasher,
    calls: Arc<AtomicUsize>,
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, password: &str, salt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.hash(password, salt)
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[tokio::test]
async fn test_unknown_user_costs_one_hash_like_wrong_password() {
    let store = seeded_store().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let hasher = Arc::new(CountingHasher {
        inner: Sha256Hasher::new(10),
        calls: Arc::clone(&calls),
    });
    let service = SessionService::in_memory(&config(), store, hasher).unwrap();

    let unknown = service
        .engine
        .login("nobody@newworld.codes", PASSWORD, IdentifierField::Email)
        .await;
    assert!(matches!(unknown, Err(RustySessionsError::InvalidCredentials)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let wrong = service
        .engine
        .login("hello@newworld.codes", "wrong", IdentifierField::Email)
        .await;
    assert!(matches!(wrong, Err(RustySessionsError::InvalidCredentials)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
