//! Authentication event tests.
//!
//! Events published by `ProviderManager` and custom failure mappings.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authn_chain_core::authentication::{
    Authentication, AuthenticationDetails, AuthenticationEvent, AuthenticationEventType,
    EventMulticaster, ExceptionMappings, InMemoryEventStore, LoggingEventListener, ProviderManager,
    TokenKind,
};
use authn_chain_core::error::{AuthError, AuthErrorKind};

use common::{init_tracing, ScriptedProvider};

#[test]
fn test_one_event_per_decision() {
    init_tracing();
    let store = InMemoryEventStore::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);

    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .event_publisher(
            EventMulticaster::new()
                .add_listener(LoggingEventListener::new())
                .add_listener(store.clone())
                .with_listener(move |_event| {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .build()
        .unwrap();

    manager
        .authenticate(&Authentication::username_password("alice", "secret"))
        .unwrap();
    manager
        .authenticate(&Authentication::request(
            TokenKind::RememberMe,
            "alice",
            Default::default(),
        ))
        .unwrap_err();

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    let types: Vec<AuthenticationEventType> = store
        .get_events()
        .iter()
        .map(|e| e.get_event_type().clone())
        .collect();
    assert_eq!(
        types,
        vec![
            AuthenticationEventType::AuthenticationSuccess,
            AuthenticationEventType::FailureProviderNotFound,
        ]
    );
}

#[test]
fn test_custom_failure_event() {
    let store = InMemoryEventStore::new();
    let mappings = ExceptionMappings::default().with_mapping(
        AuthErrorKind::AccountLocked,
        Arc::new(|request: &Authentication, error: &AuthError| {
            AuthenticationEvent::failure(
                AuthenticationEventType::Custom("lockout".into()),
                request,
                error,
            )
        }),
    );

    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::failing(
            "pw",
            TokenKind::UsernamePassword,
            AuthError::locked("User account is locked"),
        ))
        .exception_mappings(mappings)
        .event_publisher(store.clone())
        .build()
        .unwrap();

    let err = manager
        .authenticate(&Authentication::username_password("alice", "secret"))
        .unwrap_err();

    // the caller still sees the original error kind
    assert_eq!(err.auth_error_kind(), Some(AuthErrorKind::AccountLocked));
    let events = store.get_events_by_type(&AuthenticationEventType::Custom("lockout".into()));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].get_event_type().to_string(), "CUSTOM_LOCKOUT");
}

#[test]
fn test_failure_event_json_has_no_secret() {
    let store = InMemoryEventStore::new();
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::failing(
            "pw",
            TokenKind::UsernamePassword,
            AuthError::bad_credentials("Bad credentials"),
        ))
        .event_publisher(store.clone())
        .build()
        .unwrap();

    let request = Authentication::username_password("alice", "correct horse battery staple")
        .with_details(AuthenticationDetails::new().remote_address("192.168.1.1"));
    manager.authenticate(&request).unwrap_err();

    let json = store.get_events()[0].to_json();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["event_type"], "AUTHENTICATION_FAILURE_BAD_CREDENTIALS");
    assert_eq!(value["principal"], "alice");
    assert_eq!(value["remote_address"], "192.168.1.1");
    assert_eq!(value["error"], "Bad credentials");
    assert!(!json.contains("correct horse"));
}

#[test]
fn test_success_event_lists_authorities() {
    let store = InMemoryEventStore::new();
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .event_publisher(store.clone())
        .build()
        .unwrap();

    manager
        .authenticate(&Authentication::username_password("alice", "secret"))
        .unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&store.get_events()[0].to_json()).unwrap();
    assert_eq!(value["authenticated"], true);
    assert_eq!(
        value["authorities"],
        serde_json::json!(["ROLE_USER", "granted_by:pw"])
    );
    assert!(value["error"].is_null());
}
