//! Authentication events and their publishers.
//!
//! # Spring Security Equivalent
//! `AbstractAuthenticationEvent` and its subclasses, `AuthenticationEventPublisher`
//! and `LoggerListener`.
//!
//! # Example
//!
//! ```
//! use authn_chain_core::authentication::{
//!     Authentication, AuthenticationEvent, AuthenticationEventPublisher, AuthenticationEventType,
//!     EventMulticaster, InMemoryEventStore, LoggingEventListener,
//! };
//!
//! let store = InMemoryEventStore::new();
//! let publisher = EventMulticaster::new()
//!     .add_listener(LoggingEventListener::new())
//!     .add_listener(store.clone());
//!
//! let request = Authentication::username_password("alice", "secret");
//! publisher.publish(&AuthenticationEvent::failure(
//!     AuthenticationEventType::FailureBadCredentials,
//!     &request,
//!     &authn_chain_core::error::AuthError::bad_credentials("Bad credentials"),
//! ));
//!
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::ser::SerializeStruct;
use tracing::{info, warn};

use super::token::Authentication;
use crate::error::{AuthError, AuthErrorKind};

// =============================================================================
// Event Types
// =============================================================================

/// What happened during an authentication decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthenticationEventType {
    AuthenticationSuccess,
    FailureBadCredentials,
    FailureDisabled,
    FailureExpired,
    FailureCredentialsExpired,
    FailureLocked,
    FailureConcurrentLogin,
    FailureProviderNotFound,
    FailureServiceException,
    FailureProxyUntrusted,
    /// Application-defined event type for custom mappings
    Custom(String),
}

impl AuthenticationEventType {
    /// The standard failure event for an error kind.
    pub fn failure_for(kind: AuthErrorKind) -> Self {
        match kind {
            AuthErrorKind::BadCredentials => Self::FailureBadCredentials,
            AuthErrorKind::AccountDisabled => Self::FailureDisabled,
            AuthErrorKind::AccountExpired => Self::FailureExpired,
            AuthErrorKind::CredentialsExpired => Self::FailureCredentialsExpired,
            AuthErrorKind::AccountLocked => Self::FailureLocked,
            AuthErrorKind::ConcurrentLoginLimitExceeded => Self::FailureConcurrentLogin,
            AuthErrorKind::ProviderNotFound => Self::FailureProviderNotFound,
            AuthErrorKind::ProviderUnavailable => Self::FailureServiceException,
            AuthErrorKind::ProxyUntrusted => Self::FailureProxyUntrusted,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::AuthenticationSuccess)
    }
}

impl fmt::Display for AuthenticationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationSuccess => write!(f, "AUTHENTICATION_SUCCESS"),
            Self::FailureBadCredentials => write!(f, "AUTHENTICATION_FAILURE_BAD_CREDENTIALS"),
            Self::FailureDisabled => write!(f, "AUTHENTICATION_FAILURE_DISABLED"),
            Self::FailureExpired => write!(f, "AUTHENTICATION_FAILURE_EXPIRED"),
            Self::FailureCredentialsExpired => {
                write!(f, "AUTHENTICATION_FAILURE_CREDENTIALS_EXPIRED")
            }
            Self::FailureLocked => write!(f, "AUTHENTICATION_FAILURE_LOCKED"),
            Self::FailureConcurrentLogin => write!(f, "AUTHENTICATION_FAILURE_CONCURRENT_LOGIN"),
            Self::FailureProviderNotFound => {
                write!(f, "AUTHENTICATION_FAILURE_PROVIDER_NOT_FOUND")
            }
            Self::FailureServiceException => {
                write!(f, "AUTHENTICATION_FAILURE_SERVICE_EXCEPTION")
            }
            Self::FailureProxyUntrusted => write!(f, "AUTHENTICATION_FAILURE_PROXY_UNTRUSTED"),
            Self::Custom(name) => write!(f, "CUSTOM_{}", name.to_uppercase()),
        }
    }
}

// =============================================================================
// Event
// =============================================================================

/// An authentication outcome, handed to the configured publisher.
///
/// Failure events carry the original request token; success events carry the
/// proven token. Neither the log line nor the JSON form include credentials.
#[derive(Debug, Clone)]
pub struct AuthenticationEvent {
    id: String,
    /// Unix epoch milliseconds
    timestamp: u64,
    event_type: AuthenticationEventType,
    authentication: Authentication,
    error: Option<AuthError>,
}

impl AuthenticationEvent {
    fn new(
        event_type: AuthenticationEventType,
        authentication: Authentication,
        error: Option<AuthError>,
    ) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            id: generate_event_id(),
            timestamp: now,
            event_type,
            authentication,
            error,
        }
    }

    pub fn success(authentication: &Authentication) -> Self {
        Self::new(
            AuthenticationEventType::AuthenticationSuccess,
            authentication.clone(),
            None,
        )
    }

    pub fn failure(
        event_type: AuthenticationEventType,
        request: &Authentication,
        error: &AuthError,
    ) -> Self {
        Self::new(event_type, request.clone(), Some(error.clone()))
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_event_type(&self) -> &AuthenticationEventType {
        &self.event_type
    }

    pub fn get_authentication(&self) -> &Authentication {
        &self.authentication
    }

    pub fn get_error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Format the event as a log line.
    pub fn to_log_line(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.event_type),
            format!("principal={}", self.authentication.name()),
            format!("token={}", self.authentication.kind()),
        ];

        if let Some(address) = self
            .authentication
            .details()
            .and_then(|d| d.get_remote_address())
        {
            parts.push(format!("ip={}", address));
        }
        if let Some(ref error) = self.error {
            parts.push(format!("error=\"{}\"", error));
        }

        parts.join(" ")
    }

    /// Format the event as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_log_line())
    }
}

impl serde::Serialize for AuthenticationEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let authorities: Vec<&str> = self
            .authentication
            .authorities()
            .iter()
            .map(|a| a.as_str())
            .collect();
        let details = self.authentication.details();

        let mut state = serializer.serialize_struct("AuthenticationEvent", 10)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("event_type", &self.event_type.to_string())?;
        state.serialize_field("principal", self.authentication.name())?;
        state.serialize_field("token_kind", &self.authentication.kind().to_string())?;
        state.serialize_field("authenticated", &self.authentication.is_authenticated())?;
        state.serialize_field("authorities", &authorities)?;
        state.serialize_field(
            "remote_address",
            &details.and_then(|d| d.get_remote_address()),
        )?;
        state.serialize_field("error_kind", &self.error.as_ref().map(AuthError::kind))?;
        state.serialize_field("error", &self.error.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

fn generate_event_id() -> String {
    use rand::Rng;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp, random)
}

// =============================================================================
// Publishers
// =============================================================================

/// Receives every authentication outcome of a manager.
///
/// Called synchronously on the deciding thread; implementations must not
/// block for long.
pub trait AuthenticationEventPublisher: Send + Sync {
    fn publish(&self, event: &AuthenticationEvent);
}

impl<P: AuthenticationEventPublisher + ?Sized> AuthenticationEventPublisher for Arc<P> {
    fn publish(&self, event: &AuthenticationEvent) {
        (**self).publish(event)
    }
}

/// Writes events to `tracing`: successes at `info`, failures at `warn`.
#[derive(Debug, Clone)]
pub struct LoggingEventListener {
    log_successes: bool,
}

impl Default for LoggingEventListener {
    fn default() -> Self {
        Self {
            log_successes: true,
        }
    }
}

impl LoggingEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip success events, logging failures only.
    pub fn log_successes(mut self, log: bool) -> Self {
        self.log_successes = log;
        self
    }
}

impl AuthenticationEventPublisher for LoggingEventListener {
    fn publish(&self, event: &AuthenticationEvent) {
        let principal = event.authentication.name();
        match &event.error {
            Some(error) => warn!(
                event_type = %event.event_type,
                principal,
                error = %error,
                "Authentication failed"
            ),
            None if self.log_successes => info!(
                event_type = %event.event_type,
                principal,
                "Authentication succeeded"
            ),
            None => {}
        }
    }
}

/// Publisher that calls a closure.
pub struct ClosureEventListener<F>
where
    F: Fn(&AuthenticationEvent) + Send + Sync,
{
    listener: F,
}

impl<F> ClosureEventListener<F>
where
    F: Fn(&AuthenticationEvent) + Send + Sync,
{
    pub fn new(listener: F) -> Self {
        Self { listener }
    }
}

impl<F> AuthenticationEventPublisher for ClosureEventListener<F>
where
    F: Fn(&AuthenticationEvent) + Send + Sync,
{
    fn publish(&self, event: &AuthenticationEvent) {
        (self.listener)(event);
    }
}

/// Bounded in-memory event store for tests and auditing.
///
/// Clones share the same store.
#[derive(Debug, Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<VecDeque<AuthenticationEvent>>>,
    max_events: usize,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            max_events: 10000,
        }
    }

    /// Set maximum events to keep; the oldest are dropped first.
    pub fn max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    pub fn get_events(&self) -> Vec<AuthenticationEvent> {
        self.events.read().iter().cloned().collect()
    }

    pub fn get_events_by_type(
        &self,
        event_type: &AuthenticationEventType,
    ) -> Vec<AuthenticationEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| &e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn get_events_by_principal(&self, principal: &str) -> Vec<AuthenticationEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.authentication.name() == principal)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl AuthenticationEventPublisher for InMemoryEventStore {
    fn publish(&self, event: &AuthenticationEvent) {
        let mut events = self.events.write();
        events.push_back(event.clone());
        while events.len() > self.max_events {
            events.pop_front();
        }
    }
}

/// Fans each event out to several listeners, in registration order.
#[derive(Clone)]
pub struct EventMulticaster {
    listeners: Arc<Vec<Arc<dyn AuthenticationEventPublisher>>>,
    enabled: bool,
}

impl Default for EventMulticaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMulticaster {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Vec::new()),
            enabled: true,
        }
    }

    pub fn add_listener<P: AuthenticationEventPublisher + 'static>(mut self, listener: P) -> Self {
        let listeners = Arc::make_mut(&mut self.listeners);
        listeners.push(Arc::new(listener));
        self
    }

    /// Add a closure as listener.
    pub fn with_listener<F>(self, listener: F) -> Self
    where
        F: Fn(&AuthenticationEvent) + Send + Sync + 'static,
    {
        self.add_listener(ClosureEventListener::new(listener))
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl AuthenticationEventPublisher for EventMulticaster {
    fn publish(&self, event: &AuthenticationEvent) {
        if !self.enabled {
            return;
        }
        for listener in self.listeners.iter() {
            listener.publish(event);
        }
    }
}
