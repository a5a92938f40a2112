//! Session admission tests.
//!
//! Concurrent-session limits enforced through `ProviderManager`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use authn_chain_core::authentication::{
    Authentication, AuthenticationDetails, AuthenticationEventType, ConcurrencyConfig,
    ConcurrentSessionController, Credentials, InMemoryEventStore, MaximumSessionsController,
    ProviderManager, SessionRegistry, TokenKind,
};
use authn_chain_core::error::AuthErrorKind;

use common::{init_tracing, ScriptedProvider};

fn login_in_session(username: &str, session_id: &str) -> Authentication {
    Authentication::username_password(username, "secret")
        .with_details(AuthenticationDetails::new().session_id(session_id))
}

fn limited(maximum: usize) -> Arc<MaximumSessionsController> {
    Arc::new(
        MaximumSessionsController::new(ConcurrencyConfig::new().maximum_sessions(maximum))
            .unwrap(),
    )
}

#[test]
fn test_limit_is_checked_before_any_provider() {
    init_tracing();
    let controller = limited(1);
    let provider = ScriptedProvider::granting("pw", TokenKind::UsernamePassword);
    let events = InMemoryEventStore::new();

    let manager = ProviderManager::builder()
        .provider(Arc::clone(&provider))
        .session_controller(Arc::clone(&controller))
        .event_publisher(events.clone())
        .build()
        .unwrap();

    manager.authenticate(&login_in_session("alice", "s1")).unwrap();
    assert_eq!(provider.calls(), 1);

    let err = manager
        .authenticate(&login_in_session("alice", "s2"))
        .unwrap_err();

    assert_eq!(
        err.auth_error_kind(),
        Some(AuthErrorKind::ConcurrentLoginLimitExceeded)
    );
    assert_eq!(provider.calls(), 1, "no provider runs after a denied admission");
    assert_eq!(
        events
            .get_events_by_type(&AuthenticationEventType::FailureConcurrentLogin)
            .len(),
        1
    );
}

#[test]
fn test_same_session_is_readmitted() {
    let controller = limited(1);
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(Arc::clone(&controller))
        .build()
        .unwrap();

    manager.authenticate(&login_in_session("alice", "s1")).unwrap();
    manager.authenticate(&login_in_session("alice", "s1")).unwrap();
}

#[test]
fn test_other_principals_are_unaffected() {
    let controller = limited(1);
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(Arc::clone(&controller))
        .build()
        .unwrap();

    manager.authenticate(&login_in_session("alice", "a1")).unwrap();
    manager.authenticate(&login_in_session("bob", "b1")).unwrap();

    let registry = controller.registry();
    assert_eq!(registry.active_session_count("alice"), 1);
    assert_eq!(registry.active_session_count("bob"), 1);
}

#[test]
fn test_logout_frees_a_slot() {
    let controller = limited(1);
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(Arc::clone(&controller))
        .build()
        .unwrap();

    manager.authenticate(&login_in_session("alice", "s1")).unwrap();
    assert!(manager.authenticate(&login_in_session("alice", "s2")).is_err());

    controller.registry().session_destroyed("s1");

    manager.authenticate(&login_in_session("alice", "s2")).unwrap();
}

#[test]
fn test_least_recently_used_session_is_expired() {
    let registry = Arc::new(SessionRegistry::new());
    let controller = MaximumSessionsController::with_registry(
        ConcurrencyConfig::new()
            .maximum_sessions(2)
            .exception_if_maximum_exceeded(false),
        Arc::clone(&registry),
    )
    .unwrap();
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(controller)
        .build()
        .unwrap();

    manager.authenticate(&login_in_session("alice", "s1")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    manager.authenticate(&login_in_session("alice", "s2")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    registry.refresh_last_request("s1");

    manager.authenticate(&login_in_session("alice", "s3")).unwrap();

    assert!(registry.get_session_information("s2").unwrap().is_expired());
    assert!(!registry.get_session_information("s1").unwrap().is_expired());
    assert_eq!(registry.active_session_count("alice"), 2);
}

#[test]
fn test_double_registration_is_not_deduplicated() {
    let controller =
        MaximumSessionsController::new(ConcurrencyConfig::new().unlimited()).unwrap();
    let proven = Authentication::authenticated(
        TokenKind::UsernamePassword,
        "alice",
        Credentials::None,
        ["ROLE_USER"],
    )
    .unwrap();

    controller.register_successful_authentication(&proven).unwrap();
    controller.register_successful_authentication(&proven).unwrap();

    assert_eq!(controller.registry().active_session_count("alice"), 2);
}

#[test]
fn test_concurrent_logins_never_exceed_limit() {
    init_tracing();
    let controller = limited(2);
    let events = InMemoryEventStore::new();
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(Arc::clone(&controller))
        .event_publisher(events.clone())
        .build()
        .unwrap();
    let successes = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for i in 0..16 {
            let manager = &manager;
            let successes = &successes;
            scope.spawn(move || {
                let request = login_in_session("alice", &format!("session-{}", i));
                match manager.authenticate(&request) {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => assert_eq!(
                        err.auth_error_kind(),
                        Some(AuthErrorKind::ConcurrentLoginLimitExceeded)
                    ),
                }
            });
        }
    });

    assert_eq!(successes.load(Ordering::SeqCst), 2);
    assert_eq!(controller.registry().active_session_count("alice"), 2);
    assert_eq!(events.len(), 16);
}

#[test]
fn test_concurrent_logins_for_different_principals() {
    let controller = limited(1);
    let manager = ProviderManager::builder()
        .provider(ScriptedProvider::granting("pw", TokenKind::UsernamePassword))
        .session_controller(Arc::clone(&controller))
        .build()
        .unwrap();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let manager = &manager;
            scope.spawn(move || {
                let user = format!("user-{}", i);
                manager
                    .authenticate(&login_in_session(&user, &format!("{}-s", user)))
                    .unwrap();
            });
        }
    });

    assert_eq!(controller.registry().get_all_principals().len(), 8);
}
