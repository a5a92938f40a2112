use std::error::Error;
use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use serde::Serialize;

/// Shared lower-level failure wrapped by [`AuthError::ProviderUnavailable`].
pub type ServiceSource = Arc<dyn Error + Send + Sync>;

/// A typed, recoverable authentication failure.
///
/// # Spring Equivalent
/// The `AuthenticationException` hierarchy (`BadCredentialsException`,
/// `DisabledException`, `LockedException`, ...).
#[derive(Debug, Clone, Display)]
pub enum AuthError {
    #[display("{_0}")]
    BadCredentials(String),
    #[display("{_0}")]
    AccountDisabled(String),
    #[display("{_0}")]
    AccountExpired(String),
    #[display("{_0}")]
    CredentialsExpired(String),
    #[display("{_0}")]
    AccountLocked(String),
    #[display("{_0}")]
    ConcurrentLoginLimitExceeded(String),
    #[display("{_0}")]
    ProviderNotFound(String),
    /// The identity store behind a provider could not be reached.
    #[display("{message}")]
    ProviderUnavailable {
        message: String,
        source: Option<ServiceSource>,
    },
    /// A proxy in a ticket chain is not trusted.
    #[display("{_0}")]
    ProxyUntrusted(String),
}

impl AuthError {
    pub fn bad_credentials(message: impl Into<String>) -> Self {
        AuthError::BadCredentials(message.into())
    }

    pub fn disabled(message: impl Into<String>) -> Self {
        AuthError::AccountDisabled(message.into())
    }

    pub fn account_expired(message: impl Into<String>) -> Self {
        AuthError::AccountExpired(message.into())
    }

    pub fn credentials_expired(message: impl Into<String>) -> Self {
        AuthError::CredentialsExpired(message.into())
    }

    pub fn locked(message: impl Into<String>) -> Self {
        AuthError::AccountLocked(message.into())
    }

    pub fn concurrent_login(message: impl Into<String>) -> Self {
        AuthError::ConcurrentLoginLimitExceeded(message.into())
    }

    pub fn provider_not_found(message: impl Into<String>) -> Self {
        AuthError::ProviderNotFound(message.into())
    }

    pub fn proxy_untrusted(message: impl Into<String>) -> Self {
        AuthError::ProxyUntrusted(message.into())
    }

    /// Provider unavailable without an underlying cause.
    pub fn unavailable(message: impl Into<String>) -> Self {
        AuthError::ProviderUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Provider unavailable, wrapping the identity-store failure.
    pub fn service<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        AuthError::ProviderUnavailable {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Returns the kind used to look up the failure event.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::BadCredentials(_) => AuthErrorKind::BadCredentials,
            AuthError::AccountDisabled(_) => AuthErrorKind::AccountDisabled,
            AuthError::AccountExpired(_) => AuthErrorKind::AccountExpired,
            AuthError::CredentialsExpired(_) => AuthErrorKind::CredentialsExpired,
            AuthError::AccountLocked(_) => AuthErrorKind::AccountLocked,
            AuthError::ConcurrentLoginLimitExceeded(_) => {
                AuthErrorKind::ConcurrentLoginLimitExceeded
            }
            AuthError::ProviderNotFound(_) => AuthErrorKind::ProviderNotFound,
            AuthError::ProviderUnavailable { .. } => AuthErrorKind::ProviderUnavailable,
            AuthError::ProxyUntrusted(_) => AuthErrorKind::ProxyUntrusted,
        }
    }

    /// Returns the message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            AuthError::BadCredentials(m)
            | AuthError::AccountDisabled(m)
            | AuthError::AccountExpired(m)
            | AuthError::CredentialsExpired(m)
            | AuthError::AccountLocked(m)
            | AuthError::ConcurrentLoginLimitExceeded(m)
            | AuthError::ProviderNotFound(m)
            | AuthError::ProxyUntrusted(m) => m,
            AuthError::ProviderUnavailable { message, .. } => message,
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AuthError::ProviderUnavailable {
                source: Some(source),
                ..
            } => Some(&**source),
            _ => None,
        }
    }
}

/// Discriminant of [`AuthError`], the key of the exception-to-event mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AuthErrorKind {
    BadCredentials,
    AccountDisabled,
    AccountExpired,
    CredentialsExpired,
    AccountLocked,
    ConcurrentLoginLimitExceeded,
    ProviderNotFound,
    ProviderUnavailable,
    ProxyUntrusted,
}

impl AuthErrorKind {
    /// Every standard kind; the built-in mapping table covers all of them.
    pub const ALL: [AuthErrorKind; 9] = [
        AuthErrorKind::BadCredentials,
        AuthErrorKind::AccountDisabled,
        AuthErrorKind::AccountExpired,
        AuthErrorKind::CredentialsExpired,
        AuthErrorKind::AccountLocked,
        AuthErrorKind::ConcurrentLoginLimitExceeded,
        AuthErrorKind::ProviderNotFound,
        AuthErrorKind::ProviderUnavailable,
        AuthErrorKind::ProxyUntrusted,
    ];
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthErrorKind::BadCredentials => "BadCredentials",
            AuthErrorKind::AccountDisabled => "AccountDisabled",
            AuthErrorKind::AccountExpired => "AccountExpired",
            AuthErrorKind::CredentialsExpired => "CredentialsExpired",
            AuthErrorKind::AccountLocked => "AccountLocked",
            AuthErrorKind::ConcurrentLoginLimitExceeded => "ConcurrentLoginLimitExceeded",
            AuthErrorKind::ProviderNotFound => "ProviderNotFound",
            AuthErrorKind::ProviderUnavailable => "ProviderUnavailable",
            AuthErrorKind::ProxyUntrusted => "ProxyUntrusted",
        };
        f.write_str(name)
    }
}
