mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rusty_sessions::auth::events::SessionEvent;
use rusty_sessions::auth::user::IdentifierField;
use rusty_sessions::core::SessionService;
use rusty_sessions::error::RustySessionsError;
use rusty_sessions::session::model::{Session, SessionPatch, SessionReplacement};
use rusty_sessions::session::registry::SessionOperation;

use common::{service, PASSWORD};

async fn login(service: &SessionService, email: &str) -> Session {
    service
        .engine
        .login(email, PASSWORD, IdentifierField::Email)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_get_session_with_or_without_prefix() {
    let (service, _store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    let bare = service.registry.get_session(&session.token).await.unwrap();
    let prefixed = service
        .registry
        .get_session(&format!("Bearer {}", session.token))
        .await
        .unwrap();

    assert_eq!(bare.session, session);
    assert_eq!(prefixed.session, session);

    let owner = bare.user.unwrap();
    assert_eq!(owner.id, "1");
    assert_eq!(owner.username, "multicolour");
}

#[tokio::test]
async fn test_get_unknown_session_is_not_found() {
    let (service, _store) = service().await;
    let result = service.registry.get_session("Bearer nope").await;
    assert!(matches!(result, Err(RustySessionsError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_session_counts_rows() {
    let (service, store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    assert_eq!(service.registry.delete_session("Bearer unknown").await.unwrap(), 0);
    assert_eq!(
        service
            .registry
            .delete_session(&format!("Bearer {}", session.token))
            .await
            .unwrap(),
        1
    );
    assert_eq!(service.registry.delete_session(&session.token).await.unwrap(), 0);
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_delete_emits_destroyed_once() {
    let (service, _store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    let destroyed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&destroyed);
    service.events().on_event(move |event| {
        if let SessionEvent::Destroyed { .. } = event {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    service.registry.delete_session(&session.token).await.unwrap();
    service.registry.delete_session(&session.token).await.unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_users_session_is_forbidden() {
    let (service, store) = service().await;
    let theirs = login(&service, "hello@newworld.codes").await;
    let _mine = login(&service, "other@newworld.codes").await;

    let get = service.registry.get_owned(&theirs.id, "2").await;
    let patch = service
        .registry
        .patch_owned(&theirs.id, "2", SessionPatch::default())
        .await;
    let put = service
        .registry
        .put_owned(
            &theirs.id,
            "2",
            SessionReplacement {
                verifier: None,
                provider: "jwt".to_string(),
            },
        )
        .await;
    let delete = service.registry.delete_owned(&theirs.id, "2").await;

    assert!(matches!(get, Err(RustySessionsError::Forbidden)));
    assert!(matches!(patch, Err(RustySessionsError::Forbidden)));
    assert!(matches!(put, Err(RustySessionsError::Forbidden)));
    assert!(matches!(delete, Err(RustySessionsError::Forbidden)));
    assert_eq!(store.session_count().await, 2);
}

#[tokio::test]
async fn test_authorize_uses_owner_only_by_default() {
    let (service, _store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    for op in [
        SessionOperation::Get,
        SessionOperation::Patch,
        SessionOperation::Put,
        SessionOperation::Delete,
    ] {
        assert!(service.registry.authorize(op, &session, "1").is_ok());
        assert!(service.registry.authorize(op, &session, "2").is_err());
        assert!(service.registry.authorize(op, &session, "").is_err());
    }
}

#[tokio::test]
async fn test_owner_can_patch_and_put_without_touching_token() {
    let (service, _store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    let patched = service
        .registry
        .patch_owned(
            &session.id,
            "1",
            SessionPatch {
                verifier: Some("device-42".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.verifier.as_deref(), Some("device-42"));
    assert_eq!(patched.provider, "jwt");
    assert_eq!(patched.token, session.token);

    let replaced = service
        .registry
        .put_owned(
            &session.id,
            "1",
            SessionReplacement {
                verifier: None,
                provider: "jwt".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(replaced.verifier.is_none());
    assert_eq!(replaced.token, session.token);
    assert_eq!(replaced.user_id, "1");
}

#[tokio::test]
async fn test_owner_get_and_delete_by_id() {
    let (service, _store) = service().await;
    let session = login(&service, "hello@newworld.codes").await;

    let view = service.registry.get_owned(&session.id, "1").await.unwrap();
    assert_eq!(view.session.id, session.id);

    assert_eq!(service.registry.delete_owned(&session.id, "1").await.unwrap(), 1);
    assert_eq!(service.registry.delete_owned(&session.id, "1").await.unwrap(), 0);
    assert!(matches!(
        service.registry.get_owned(&session.id, "1").await,
        Err(RustySessionsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_multibyte_token_is_unknown_not_a_crash() {
    let (service, _store) = service().await;
    login(&service, "hello@newworld.codes").await;

    let get = service.registry.get_session("Bearerélan").await;
    assert!(matches!(get, Err(RustySessionsError::NotFound(_))));
    assert_eq!(service.registry.delete_session("Bearerélan").await.unwrap(), 0);
    assert_eq!(service.registry.delete_session("Bearer élan").await.unwrap(), 0);
}
