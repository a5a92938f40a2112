//! Error types.
//!
//! Two classes of failure never mix: [`AuthError`] is a recoverable,
//! user-facing authentication failure, [`ConfigurationError`] is an
//! operator-facing misconfiguration. [`ManagerError`] is what
//! `ProviderManager::authenticate` returns and keeps them apart.

pub use auth_error::{AuthError, AuthErrorKind};
pub use configuration_error::{ConfigurationError, ManagerError};

mod auth_error;
mod configuration_error;
