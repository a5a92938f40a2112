//! Common test utilities and configuration.
//!
//! This module provides shared test infrastructure including:
//! - Scriptable providers that count their invocations
//! - Test user store
//! - Tracing setup

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use authn_chain_core::authentication::{
    Argon2PasswordEncoder, Authentication, AuthenticationProvider, InMemoryUserDetailsService,
    PasswordEncoder, TokenKind, User,
};
use authn_chain_core::error::{AuthError, AuthErrorKind};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Tracing
// =============================================================================

/// Routes `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with every event down to `TRACE` written to the returned buffer.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

// =============================================================================
// Scripted Providers
// =============================================================================

enum Outcome {
    Grant,
    Fail(AuthError),
}

/// Provider with a fixed outcome for the kinds it supports.
///
/// Proven tokens carry `ROLE_USER` plus `granted_by:<name>` so tests can tell
/// which provider won.
pub struct ScriptedProvider {
    name: String,
    kinds: Vec<TokenKind>,
    outcome: Outcome,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn granting(name: &str, kind: TokenKind) -> Arc<Self> {
        Self::build(name, vec![kind], Outcome::Grant)
    }

    pub fn failing(name: &str, kind: TokenKind, error: AuthError) -> Arc<Self> {
        Self::build(name, vec![kind], Outcome::Fail(error))
    }

    /// Supports no kind at all.
    pub fn unsupported(name: &str) -> Arc<Self> {
        Self::build(name, Vec::new(), Outcome::Grant)
    }

    fn build(name: &str, kinds: Vec<TokenKind>, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kinds,
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of `authenticate` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthenticationProvider for ScriptedProvider {
    fn supports(&self, kind: &TokenKind) -> bool {
        self.kinds.contains(kind)
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        if !self.supports(authentication.kind()) {
            return Ok(None);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            Outcome::Grant => Authentication::proven_from(
                authentication,
                authentication.principal().clone(),
                ["ROLE_USER".to_string(), format!("granted_by:{}", self.name)],
            )
            .map(Some)
            .map_err(|_| AuthError::bad_credentials("no authorities")),
            Outcome::Fail(error) => Err(error.clone()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        match &self.outcome {
            Outcome::Grant => Vec::new(),
            Outcome::Fail(error) => vec![error.kind()],
        }
    }
}

// =============================================================================
// Test Users
// =============================================================================

/// Users with Argon2-encoded passwords equal to their usernames.
///
/// Users:
/// - admin/admin: ADMIN, USER roles + users:read, users:write authorities
/// - user/user: USER role + users:read authority
/// - locked/locked: USER role, account locked
/// - guest/guest: no roles and no authorities
pub fn test_users() -> InMemoryUserDetailsService {
    let encoder = Argon2PasswordEncoder::new();
    let encode = |raw: &str| encoder.encode(raw).expect("argon2 encoding");

    InMemoryUserDetailsService::with_users(vec![
        User::with_encoded_password("admin", encode("admin"))
            .roles(&["ADMIN".into(), "USER".into()])
            .authorities(&["users:read".into(), "users:write".into()]),
        User::with_encoded_password("user", encode("user"))
            .roles(&["USER".into()])
            .authorities(&["users:read".into()]),
        User::with_encoded_password("locked", encode("locked"))
            .roles(&["USER".into()])
            .account_locked(true),
        User::with_encoded_password("guest", encode("guest")),
    ])
}
