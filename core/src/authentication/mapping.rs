//! Mapping from failure kinds to the events published for them.
//!
//! # Spring Security Equivalent
//! `DefaultAuthenticationEventPublisher`'s exception-to-event table
//! (`setAdditionalExceptionMappings`)

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::event::{AuthenticationEvent, AuthenticationEventType};
use super::token::Authentication;
use crate::error::{AuthError, AuthErrorKind};

/// Builds the failure event for a request token and its error.
pub type EventFactory =
    Arc<dyn Fn(&Authentication, &AuthError) -> AuthenticationEvent + Send + Sync>;

/// Table consulted by the manager when a decision fails.
///
/// [`ExceptionMappings::default`] covers every [`AuthErrorKind`] with its
/// standard failure event. A kind without an entry is a misconfiguration: the
/// manager rejects it at build time when the kind is declared, and at decision
/// time otherwise.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use authn_chain_core::authentication::{
///     Authentication, AuthenticationEvent, AuthenticationEventType, ExceptionMappings,
/// };
/// use authn_chain_core::error::{AuthError, AuthErrorKind};
///
/// let mappings = ExceptionMappings::default().with_mapping(
///     AuthErrorKind::AccountLocked,
///     Arc::new(|request: &Authentication, error: &AuthError| {
///         AuthenticationEvent::failure(
///             AuthenticationEventType::Custom("lockout".into()),
///             request,
///             error,
///         )
///     }),
/// );
/// assert!(mappings.contains(AuthErrorKind::AccountLocked));
/// ```
#[derive(Clone)]
pub struct ExceptionMappings {
    mappings: BTreeMap<AuthErrorKind, EventFactory>,
}

impl Default for ExceptionMappings {
    fn default() -> Self {
        let mut mappings = Self::empty();
        for kind in AuthErrorKind::ALL {
            mappings.insert(kind, standard_factory(kind));
        }
        mappings
    }
}

fn standard_factory(kind: AuthErrorKind) -> EventFactory {
    let event_type = AuthenticationEventType::failure_for(kind);
    Arc::new(move |request: &Authentication, error: &AuthError| {
        AuthenticationEvent::failure(event_type.clone(), request, error)
    })
}

impl ExceptionMappings {
    /// A table with no entries at all.
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, kind: AuthErrorKind, factory: EventFactory) {
        self.mappings.insert(kind, factory);
    }

    pub fn remove(&mut self, kind: AuthErrorKind) -> Option<EventFactory> {
        self.mappings.remove(&kind)
    }

    /// Adds or replaces a mapping (builder pattern).
    pub fn with_mapping(mut self, kind: AuthErrorKind, factory: EventFactory) -> Self {
        self.insert(kind, factory);
        self
    }

    /// Maps `kind` to its standard failure event.
    pub fn with_standard_mapping(self, kind: AuthErrorKind) -> Self {
        self.with_mapping(kind, standard_factory(kind))
    }

    /// Drops the mapping for `kind` (builder pattern).
    pub fn without_mapping(mut self, kind: AuthErrorKind) -> Self {
        self.remove(kind);
        self
    }

    pub fn contains(&self, kind: AuthErrorKind) -> bool {
        self.mappings.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<AuthErrorKind> {
        self.mappings.keys().copied().collect()
    }

    /// First kind in `required` that has no mapping.
    pub fn first_unmapped<I>(&self, required: I) -> Option<AuthErrorKind>
    where
        I: IntoIterator<Item = AuthErrorKind>,
    {
        required.into_iter().find(|kind| !self.contains(*kind))
    }

    /// Builds the event for `error`, or `None` when its kind is unmapped.
    pub fn create_event(
        &self,
        request: &Authentication,
        error: &AuthError,
    ) -> Option<AuthenticationEvent> {
        self.mappings
            .get(&error.kind())
            .map(|factory| factory(request, error))
    }
}

impl fmt::Debug for ExceptionMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionMappings")
            .field("kinds", &self.kinds())
            .finish()
    }
}
