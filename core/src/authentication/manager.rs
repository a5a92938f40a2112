//! The provider chain coordinator.
//!
//! # Spring Security Equivalent
//! `ProviderManager` (with its `ConcurrentSessionController` and
//! `AuthenticationEventPublisher` collaborators)
//!
//! A decision runs in this order:
//!
//! 1. The session controller's admission check. A denial skips every provider.
//! 2. The providers, in configured order. Providers that do not support the
//!    token kind are skipped; an error is remembered and the next provider is
//!    tried; the first proven token ends the loop.
//! 3. On success the session controller registers the login, credentials are
//!    erased (unless disabled) and a success event is published.
//! 4. On failure the last error (or `ProviderNotFound` when no provider
//!    produced one) is turned into an event through [`ExceptionMappings`],
//!    published, and returned.
//!
//! An error kind without a mapping aborts the decision with
//! [`ConfigurationError::MissingEventMapping`]; no event is published.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::event::{AuthenticationEvent, AuthenticationEventPublisher, LoggingEventListener};
use super::mapping::ExceptionMappings;
use super::provider::AuthenticationProvider;
use super::session::{ConcurrentSessionController, NullConcurrentSessionController};
use super::token::Authentication;
use crate::error::{AuthError, AuthErrorKind, ConfigurationError, ManagerError};

/// Authenticates tokens against an ordered list of providers.
///
/// Immutable once built and safe to share between request threads.
pub struct ProviderManager {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
    session_controller: Arc<dyn ConcurrentSessionController>,
    event_publisher: Arc<dyn AuthenticationEventPublisher>,
    exception_mappings: ExceptionMappings,
    erase_credentials_after_authentication: bool,
}

impl ProviderManager {
    pub fn builder() -> ProviderManagerBuilder {
        ProviderManagerBuilder::new()
    }

    /// Manager with default collaborators.
    pub fn new(
        providers: Vec<Arc<dyn AuthenticationProvider>>,
    ) -> Result<Self, ConfigurationError> {
        Self::builder().providers(providers).build()
    }

    /// Decides `authentication`.
    ///
    /// Returns the proven token, the [`AuthError`] of the failed decision
    /// (after its event was published), or a configuration error.
    pub fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Authentication, ManagerError> {
        if self.providers.is_empty() {
            warn!("Authentication attempted without any provider");
            return Err(ConfigurationError::EmptyProviderList.into());
        }

        let error = match self
            .session_controller
            .check_authentication_allowed(authentication)
        {
            Ok(()) => match self.try_providers(authentication) {
                Ok(result) => return self.complete(authentication, result),
                Err(error) => error,
            },
            Err(error) => {
                debug!(
                    principal = authentication.name(),
                    "Session controller denied authentication"
                );
                error
            }
        };

        self.fail(authentication, error)
    }

    /// Runs the provider chain; the first proven token wins, the last error
    /// is kept otherwise.
    fn try_providers(&self, authentication: &Authentication) -> Result<Authentication, AuthError> {
        let kind = authentication.kind();
        let mut last_error = None;

        for provider in &self.providers {
            if !provider.supports(kind) {
                continue;
            }

            debug!("Authentication attempt using {}", provider.name());

            match provider.authenticate(authentication) {
                Ok(Some(result)) if result.is_authenticated() => return Ok(result),
                Ok(Some(_)) => {
                    warn!(
                        provider = provider.name(),
                        "Provider returned an unauthenticated token, ignoring it"
                    );
                }
                Ok(None) => {}
                Err(error) => {
                    // a later provider may still succeed, keep the error out of the logs
                    debug!(provider = provider.name(), "Provider rejected authentication");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AuthError::provider_not_found(format!("No authentication provider found for {}", kind))
        }))
    }

    fn complete(
        &self,
        request: &Authentication,
        result: Authentication,
    ) -> Result<Authentication, ManagerError> {
        if let Err(error) = self
            .session_controller
            .register_successful_authentication(&result)
        {
            return self.fail(request, error);
        }

        let result = if self.erase_credentials_after_authentication {
            result.without_credentials()
        } else {
            result
        };

        self.event_publisher
            .publish(&AuthenticationEvent::success(&result));
        Ok(result)
    }

    fn fail(&self, request: &Authentication, error: AuthError) -> Result<Authentication, ManagerError> {
        let event = match self.exception_mappings.create_event(request, &error) {
            Some(event) => event,
            None => {
                let kind = error.kind();
                warn!(%kind, error = %error, "No event mapping for authentication failure");
                return Err(ConfigurationError::MissingEventMapping { kind }.into());
            }
        };

        self.event_publisher.publish(&event);
        Err(ManagerError::Authentication(error))
    }

    pub fn get_providers(&self) -> &[Arc<dyn AuthenticationProvider>] {
        &self.providers
    }

    pub fn get_exception_mappings(&self) -> &ExceptionMappings {
        &self.exception_mappings
    }

    pub fn is_erase_credentials_after_authentication(&self) -> bool {
        self.erase_credentials_after_authentication
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects the manager's collaborators and validates them in
/// [`build`](ProviderManagerBuilder::build).
///
/// # Example
/// ```
/// use authn_chain_core::authentication::{
///     AnonymousAuthenticationProvider, ConcurrencyConfig, InMemoryEventStore,
///     MaximumSessionsController, ProviderManager,
/// };
///
/// let events = InMemoryEventStore::new();
/// let manager = ProviderManager::builder()
///     .provider(AnonymousAuthenticationProvider::new("anon-key").unwrap())
///     .session_controller(
///         MaximumSessionsController::new(ConcurrencyConfig::new().maximum_sessions(2)).unwrap(),
///     )
///     .event_publisher(events.clone())
///     .build()
///     .unwrap();
/// assert_eq!(manager.get_providers().len(), 1);
/// ```
pub struct ProviderManagerBuilder {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
    session_controller: Option<Arc<dyn ConcurrentSessionController>>,
    event_publisher: Option<Arc<dyn AuthenticationEventPublisher>>,
    exception_mappings: Option<ExceptionMappings>,
    erase_credentials_after_authentication: bool,
}

impl Default for ProviderManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderManagerBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            session_controller: None,
            event_publisher: None,
            exception_mappings: None,
            erase_credentials_after_authentication: true,
        }
    }

    /// Appends a provider; providers are consulted in the order added.
    pub fn provider<P: AuthenticationProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends several already shared providers.
    pub fn providers(mut self, providers: Vec<Arc<dyn AuthenticationProvider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn session_controller<C: ConcurrentSessionController + 'static>(
        mut self,
        controller: C,
    ) -> Self {
        self.session_controller = Some(Arc::new(controller));
        self
    }

    pub fn event_publisher<E: AuthenticationEventPublisher + 'static>(mut self, publisher: E) -> Self {
        self.event_publisher = Some(Arc::new(publisher));
        self
    }

    pub fn exception_mappings(mut self, mappings: ExceptionMappings) -> Self {
        self.exception_mappings = Some(mappings);
        self
    }

    /// Whether proven tokens lose their credentials before being returned
    /// (default `true`).
    pub fn erase_credentials_after_authentication(mut self, erase: bool) -> Self {
        self.erase_credentials_after_authentication = erase;
        self
    }

    pub fn build(self) -> Result<ProviderManager, ConfigurationError> {
        if self.providers.is_empty() {
            return Err(ConfigurationError::EmptyProviderList);
        }

        let session_controller = self
            .session_controller
            .unwrap_or_else(|| Arc::new(NullConcurrentSessionController));
        let exception_mappings = self.exception_mappings.unwrap_or_default();

        let required = std::iter::once(AuthErrorKind::ProviderNotFound)
            .chain(self.providers.iter().flat_map(|p| p.declared_errors()))
            .chain(session_controller.declared_errors());
        if let Some(kind) = exception_mappings.first_unmapped(required) {
            return Err(ConfigurationError::MissingEventMapping { kind });
        }

        let event_publisher = self
            .event_publisher
            .unwrap_or_else(|| Arc::new(LoggingEventListener::new()));

        info!(
            providers = self.providers.len(),
            erase_credentials = self.erase_credentials_after_authentication,
            "Provider manager configured"
        );

        Ok(ProviderManager {
            providers: self.providers,
            session_controller,
            event_publisher,
            exception_mappings,
            erase_credentials_after_authentication: self.erase_credentials_after_authentication,
        })
    }
}
