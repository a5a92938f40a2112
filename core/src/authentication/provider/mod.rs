//! Authentication providers.
//!
//! # Spring Equivalent
//! `AuthenticationProvider` interface and its standard implementations
//!
//! # Implementer obligations
//! - `supports` is a pure predicate on the token kind.
//! - `authenticate` returns `Ok(None)` only for kinds the provider does not
//!   support. For a supported kind it returns either a proven token or an
//!   [`AuthError`]; the manager cannot tell a silent `None` apart from a
//!   decline.
//! - Proven tokens are built with `Authentication::authenticated` or
//!   `Authentication::proven_from`; the request token is never returned as-is.

use std::sync::Arc;

use crate::authentication::token::{Authentication, TokenKind};
use crate::error::{AuthError, AuthErrorKind};

pub use anonymous::AnonymousAuthenticationProvider;
pub use dao::DaoAuthenticationProvider;
pub use pre_authenticated::{
    PreAuthenticatedAuthenticationProvider, PreAuthenticatedProviderBuilder, RoleAuthorityMapper,
};
pub use remember_me::RememberMeAuthenticationProvider;

mod anonymous;
mod dao;
mod pre_authenticated;
mod remember_me;

/// Evaluates one kind of authentication request.
pub trait AuthenticationProvider: Send + Sync {
    /// Whether this provider handles tokens of `kind`.
    fn supports(&self, kind: &TokenKind) -> bool;

    /// Authenticates the request.
    ///
    /// May block on an external identity store.
    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError>;

    /// Name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Error kinds this provider can raise, checked against the event mapping
    /// when the manager is built.
    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        Vec::new()
    }
}

impl<P: AuthenticationProvider + ?Sized> AuthenticationProvider for Arc<P> {
    fn supports(&self, kind: &TokenKind) -> bool {
        (**self).supports(kind)
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        (**self).authenticate(authentication)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        (**self).declared_errors()
    }
}
