use std::error::Error;

use derive_more::{Display, From};

use super::auth_error::{AuthError, AuthErrorKind};

/// A non-recoverable misconfiguration of the authentication chain.
///
/// Raised at build time whenever it can be detected there, and at decision
/// time as a fallback (an error kind nobody declared has no event mapping).
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ConfigurationError {
    #[display("A list of AuthenticationProviders is required")]
    EmptyProviderList,
    #[display("A valid event must be available for the exception {kind}")]
    MissingEventMapping { kind: AuthErrorKind },
    #[display("{_0} is required")]
    MissingCollaborator(&'static str),
    #[display("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

impl Error for ConfigurationError {}

/// Outcome error of `ProviderManager::authenticate`.
#[derive(Debug, Clone, Display, From)]
pub enum ManagerError {
    /// The request was rejected; the matching failure event has been published.
    #[display("{_0}")]
    Authentication(AuthError),
    /// The chain is misconfigured; no event was published.
    #[display("authentication chain misconfigured: {_0}")]
    Configuration(ConfigurationError),
}

impl ManagerError {
    pub fn as_auth_error(&self) -> Option<&AuthError> {
        match self {
            ManagerError::Authentication(err) => Some(err),
            ManagerError::Configuration(_) => None,
        }
    }

    pub fn as_configuration_error(&self) -> Option<&ConfigurationError> {
        match self {
            ManagerError::Configuration(err) => Some(err),
            ManagerError::Authentication(_) => None,
        }
    }

    /// Kind of the authentication failure, `None` for configuration errors.
    pub fn auth_error_kind(&self) -> Option<AuthErrorKind> {
        self.as_auth_error().map(AuthError::kind)
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ManagerError::Configuration(_))
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ManagerError::Authentication(err) => Some(err),
            ManagerError::Configuration(err) => Some(err),
        }
    }
}
