//! Concurrent-session admission control.
//!
//! # Spring Security Equivalent
//! `ConcurrentSessionController`, `SessionRegistryImpl`, `SessionInformation`
//! and `ConcurrentSessionControllerImpl`.
//!
//! The manager asks the controller before any provider runs
//! ([`ConcurrentSessionController::check_authentication_allowed`]) and again
//! after a provider succeeded
//! ([`ConcurrentSessionController::register_successful_authentication`]).
//! Registration re-checks the limit while holding the principal's lock, so two
//! concurrent logins for the same principal cannot both take the last slot.
//!
//! # Example
//! ```
//! use authn_chain_core::authentication::{
//!     Authentication, ConcurrencyConfig, ConcurrentSessionController, MaximumSessionsController,
//!     TokenKind, Credentials,
//! };
//!
//! let controller = MaximumSessionsController::new(
//!     ConcurrencyConfig::new().maximum_sessions(1),
//! ).unwrap();
//!
//! let proven = Authentication::authenticated(
//!     TokenKind::UsernamePassword, "alice", Credentials::None, ["ROLE_USER"],
//! ).unwrap();
//! controller.register_successful_authentication(&proven).unwrap();
//!
//! let second = Authentication::username_password("alice", "secret");
//! assert!(controller.check_authentication_allowed(&second).is_err());
//! ```

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::token::Authentication;
use crate::error::{AuthError, AuthErrorKind, ConfigurationError};

// =============================================================================
// Controller Trait
// =============================================================================

/// Decides whether a principal may open another authenticated session.
pub trait ConcurrentSessionController: Send + Sync {
    /// Called before any provider is consulted.
    fn check_authentication_allowed(&self, request: &Authentication) -> Result<(), AuthError>;

    /// Called once per successful decision with the proven token.
    ///
    /// Registration never de-duplicates: calling it twice for the same token
    /// records two sessions.
    fn register_successful_authentication(
        &self,
        authentication: &Authentication,
    ) -> Result<(), AuthError>;

    /// Error kinds this controller can raise.
    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        Vec::new()
    }
}

impl<C: ConcurrentSessionController + ?Sized> ConcurrentSessionController for Arc<C> {
    fn check_authentication_allowed(&self, request: &Authentication) -> Result<(), AuthError> {
        (**self).check_authentication_allowed(request)
    }

    fn register_successful_authentication(
        &self,
        authentication: &Authentication,
    ) -> Result<(), AuthError> {
        (**self).register_successful_authentication(authentication)
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        (**self).declared_errors()
    }
}

/// Admits everything and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConcurrentSessionController;

impl ConcurrentSessionController for NullConcurrentSessionController {
    fn check_authentication_allowed(&self, _request: &Authentication) -> Result<(), AuthError> {
        Ok(())
    }

    fn register_successful_authentication(
        &self,
        _authentication: &Authentication,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

// =============================================================================
// Session Registry
// =============================================================================

/// One authenticated session of a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInformation {
    principal: String,
    session_id: String,
    last_request: Instant,
    expired: bool,
}

impl SessionInformation {
    pub fn new(principal: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            session_id: session_id.into(),
            last_request: Instant::now(),
            expired: false,
        }
    }

    pub fn get_principal(&self) -> &str {
        &self.principal
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }

    pub fn get_last_request(&self) -> Instant {
        self.last_request
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn refresh_last_request(&mut self) {
        self.last_request = Instant::now();
    }

    pub fn expire_now(&mut self) {
        self.expired = true;
    }
}

type PrincipalSessions = Arc<Mutex<Vec<SessionInformation>>>;

/// Tracks sessions per principal.
///
/// Each principal's sessions sit behind their own lock; unrelated principals
/// never contend. Principal entries are kept once created so a registration
/// holding a principal's lock can never write into a removed entry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    principals: DashMap<String, PrincipalSessions>,
    session_ids: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions_of(&self, principal: &str) -> PrincipalSessions {
        if let Some(sessions) = self.principals.get(principal) {
            return Arc::clone(sessions.value());
        }
        Arc::clone(self.principals.entry(principal.to_string()).or_default().value())
    }

    fn sessions_for_id(&self, session_id: &str) -> Option<PrincipalSessions> {
        let principal = self.session_ids.get(session_id)?.value().clone();
        self.principals
            .get(&principal)
            .map(|sessions| Arc::clone(sessions.value()))
    }

    /// Runs `f` with exclusive access to the principal's sessions.
    pub(crate) fn with_sessions<R>(
        &self,
        principal: &str,
        f: impl FnOnce(&mut Vec<SessionInformation>) -> R,
    ) -> R {
        let sessions = self.sessions_of(principal);
        let mut guard = sessions.lock();
        f(&mut guard)
    }

    /// Points `session_id` at `principal`.
    ///
    /// A session id belongs to one principal at a time: when it was indexed
    /// under someone else, that principal's record of it is dropped.
    fn index_session(&self, session_id: &str, principal: &str) {
        let previous = self
            .session_ids
            .insert(session_id.to_string(), principal.to_string());
        let Some(previous) = previous.filter(|owner| owner != principal) else {
            return;
        };
        if let Some(sessions) = self.principals.get(&previous).map(|s| Arc::clone(s.value())) {
            sessions.lock().retain(|s| s.session_id != session_id);
        }
        debug!(
            session_id,
            previous_principal = %previous,
            principal,
            "Session id moved to another principal"
        );
    }

    pub fn register_new_session(&self, session_id: &str, principal: &str) {
        self.with_sessions(principal, |sessions| {
            sessions.push(SessionInformation::new(principal, session_id));
        });
        self.index_session(session_id, principal);
        debug!(principal, session_id, "Registered new session");
    }

    /// Sessions of `principal`, optionally including expired ones.
    pub fn get_all_sessions(&self, principal: &str, include_expired: bool) -> Vec<SessionInformation> {
        match self.principals.get(principal).map(|s| Arc::clone(s.value())) {
            Some(sessions) => sessions
                .lock()
                .iter()
                .filter(|s| include_expired || !s.expired)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn get_session_information(&self, session_id: &str) -> Option<SessionInformation> {
        self.sessions_for_id(session_id)?
            .lock()
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    /// Principals with at least one recorded session.
    pub fn get_all_principals(&self) -> Vec<String> {
        let entries: Vec<(String, PrincipalSessions)> = self
            .principals
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        entries
            .into_iter()
            .filter(|(_, sessions)| !sessions.lock().is_empty())
            .map(|(principal, _)| principal)
            .collect()
    }

    /// Number of non-expired sessions of `principal`.
    pub fn active_session_count(&self, principal: &str) -> usize {
        self.get_all_sessions(principal, false).len()
    }

    pub fn refresh_last_request(&self, session_id: &str) {
        if let Some(sessions) = self.sessions_for_id(session_id) {
            sessions
                .lock()
                .iter_mut()
                .filter(|s| s.session_id == session_id)
                .for_each(SessionInformation::refresh_last_request);
        }
    }

    /// Marks the session expired; it stays listed until removed.
    pub fn expire_now(&self, session_id: &str) {
        if let Some(sessions) = self.sessions_for_id(session_id) {
            sessions
                .lock()
                .iter_mut()
                .filter(|s| s.session_id == session_id)
                .for_each(SessionInformation::expire_now);
        }
    }

    pub fn remove_session_information(&self, session_id: &str) {
        if let Some(sessions) = self.sessions_for_id(session_id) {
            sessions.lock().retain(|s| s.session_id != session_id);
        }
        if self.session_ids.remove(session_id).is_some() {
            debug!(session_id, "Removed session information");
        }
    }

    /// Hook for the session container when a session is destroyed.
    pub fn session_destroyed(&self, session_id: &str) {
        self.remove_session_information(session_id);
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Session limit settings, loadable from JSON.
///
/// # Example
/// ```
/// use authn_chain_core::authentication::ConcurrencyConfig;
///
/// let config = ConcurrencyConfig::from_json(
///     r#"{ "maximum_sessions": 3, "exception_if_maximum_exceeded": false }"#,
/// ).unwrap();
/// assert_eq!(config.get_maximum_sessions(), Some(3));
/// assert!(!config.is_exception_if_maximum_exceeded());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// `None` means unlimited.
    maximum_sessions: Option<usize>,
    /// Reject the new login instead of expiring the least recently used session.
    exception_if_maximum_exceeded: bool,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            maximum_sessions: Some(1),
            exception_if_maximum_exceeded: true,
        }
    }
}

impl ConcurrencyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidSetting {
                name: "concurrency",
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn maximum_sessions(mut self, maximum: usize) -> Self {
        self.maximum_sessions = Some(maximum);
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.maximum_sessions = None;
        self
    }

    pub fn exception_if_maximum_exceeded(mut self, exception: bool) -> Self {
        self.exception_if_maximum_exceeded = exception;
        self
    }

    pub fn get_maximum_sessions(&self) -> Option<usize> {
        self.maximum_sessions
    }

    pub fn is_exception_if_maximum_exceeded(&self) -> bool {
        self.exception_if_maximum_exceeded
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.maximum_sessions == Some(0) {
            return Err(ConfigurationError::InvalidSetting {
                name: "maximum_sessions",
                reason: "must be at least 1, or unlimited".into(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Maximum Sessions Controller
// =============================================================================

/// Limits the number of live sessions per principal.
///
/// When the limit is reached the new login is either rejected with
/// [`AuthError::ConcurrentLoginLimitExceeded`] or admitted after expiring the
/// principal's least recently used session, depending on
/// [`ConcurrencyConfig::exception_if_maximum_exceeded`].
///
/// A request carrying a session id the principal already owns is always
/// admitted. Registration does not de-duplicate, so logging in again from an
/// owned session records a second entry with the same id: it counts towards
/// [`SessionRegistry::active_session_count`] and towards the limit for later
/// logins from other sessions, until the id is removed.
#[derive(Debug)]
pub struct MaximumSessionsController {
    registry: Arc<SessionRegistry>,
    config: ConcurrencyConfig,
}

impl MaximumSessionsController {
    pub fn new(config: ConcurrencyConfig) -> Result<Self, ConfigurationError> {
        Self::with_registry(config, Arc::new(SessionRegistry::new()))
    }

    /// Shares `registry` with other components (logout handlers, admin views).
    pub fn with_registry(
        config: ConcurrencyConfig,
        registry: Arc<SessionRegistry>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn get_config(&self) -> &ConcurrencyConfig {
        &self.config
    }

    fn limit_exceeded(maximum: usize) -> AuthError {
        AuthError::concurrent_login(format!(
            "Maximum sessions of {} for this principal exceeded",
            maximum
        ))
    }
}

fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

impl ConcurrentSessionController for MaximumSessionsController {
    fn check_authentication_allowed(&self, request: &Authentication) -> Result<(), AuthError> {
        let Some(maximum) = self.config.maximum_sessions else {
            return Ok(());
        };

        let sessions = self.registry.get_all_sessions(request.name(), false);
        if let Some(session_id) = request.session_id() {
            if sessions.iter().any(|s| s.session_id == session_id) {
                return Ok(());
            }
        }
        if sessions.len() < maximum || !self.config.exception_if_maximum_exceeded {
            return Ok(());
        }

        debug!(
            principal = request.name(),
            maximum, "Session limit reached, rejecting authentication"
        );
        Err(Self::limit_exceeded(maximum))
    }

    fn register_successful_authentication(
        &self,
        authentication: &Authentication,
    ) -> Result<(), AuthError> {
        let principal = authentication.name();
        let session_id = authentication
            .session_id()
            .map(str::to_string)
            .unwrap_or_else(generate_session_id);

        self.registry.with_sessions(principal, |sessions| {
            if let Some(maximum) = self.config.maximum_sessions {
                let owned = sessions
                    .iter()
                    .any(|s| !s.expired && s.session_id == session_id);
                let mut active = sessions.iter().filter(|s| !s.expired).count();

                if !owned && active >= maximum {
                    if self.config.exception_if_maximum_exceeded {
                        return Err(Self::limit_exceeded(maximum));
                    }
                    while active >= maximum {
                        let lru = sessions
                            .iter_mut()
                            .filter(|s| !s.expired)
                            .min_by_key(|s| s.last_request);
                        match lru {
                            Some(session) => {
                                debug!(
                                    principal,
                                    session_id = %session.session_id,
                                    "Expiring least recently used session"
                                );
                                session.expire_now();
                                active -= 1;
                            }
                            None => break,
                        }
                    }
                }
            }
            sessions.push(SessionInformation::new(principal, session_id.as_str()));
            Ok(())
        })?;

        self.registry.index_session(&session_id, principal);
        debug!(principal, session_id = %session_id, "Registered new session");
        Ok(())
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        vec![AuthErrorKind::ConcurrentLoginLimitExceeded]
    }
}
