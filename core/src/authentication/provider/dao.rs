//! Password-comparison provider backed by a user store.
//!
//! # Spring Equivalent
//! `DaoAuthenticationProvider`

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::authentication::crypto::{NoOpPasswordEncoder, PasswordEncoder};
use crate::authentication::token::{Authentication, Credentials, TokenKind};
use crate::authentication::user_details::{AccountStatusChecker, UserDetailsService};
use crate::error::{AuthError, AuthErrorKind};

use super::AuthenticationProvider;

const BAD_CREDENTIALS: &str = "Bad credentials";

/// Raw password encoded once and compared against when the user is unknown.
const USER_NOT_FOUND_PASSWORD: &str = "userNotFoundPassword";

/// Loads the user by name and compares the presented password with the
/// stored encoding.
///
/// # Example
/// ```
/// use authn_chain_core::authentication::{
///     Authentication, AuthenticationProvider, DaoAuthenticationProvider,
///     InMemoryUserDetailsService, User,
/// };
///
/// let users = InMemoryUserDetailsService::with_users(vec![
///     User::new("alice".into(), "secret".into()).roles(&["USER".into()]),
/// ]);
/// let provider = DaoAuthenticationProvider::new(users);
///
/// let proven = provider
///     .authenticate(&Authentication::username_password("alice", "secret"))
///     .unwrap()
///     .unwrap();
/// assert!(proven.is_authenticated());
/// ```
pub struct DaoAuthenticationProvider {
    user_details_service: Arc<dyn UserDetailsService>,
    password_encoder: Arc<dyn PasswordEncoder>,
    status_checker: AccountStatusChecker,
    hide_user_not_found: bool,
    user_not_found_encoded_password: OnceLock<Option<String>>,
}

impl DaoAuthenticationProvider {
    /// Uses plain-text password comparison until an encoder is set.
    pub fn new<S: UserDetailsService + 'static>(user_details_service: S) -> Self {
        Self {
            user_details_service: Arc::new(user_details_service),
            password_encoder: Arc::new(NoOpPasswordEncoder),
            status_checker: AccountStatusChecker,
            hide_user_not_found: true,
            user_not_found_encoded_password: OnceLock::new(),
        }
    }

    pub fn password_encoder<E: PasswordEncoder + 'static>(mut self, encoder: E) -> Self {
        self.password_encoder = Arc::new(encoder);
        self.user_not_found_encoded_password = OnceLock::new();
        self
    }

    /// When `false`, an unknown user is reported with its own message instead
    /// of the generic "Bad credentials". The kind stays `BadCredentials`.
    pub fn hide_user_not_found(mut self, hide: bool) -> Self {
        self.hide_user_not_found = hide;
        self
    }
}

impl DaoAuthenticationProvider {
    /// Spends one encoder comparison on an unknown user so that it takes as
    /// long as a wrong password for a known one.
    fn mitigate_against_timing_attack(&self, presented: &str) {
        let encoded = self.user_not_found_encoded_password.get_or_init(|| {
            self.password_encoder
                .encode(USER_NOT_FOUND_PASSWORD)
                .map_err(|e| debug!(error = %e, "Unable to encode the user-not-found password"))
                .ok()
        });
        if let Some(encoded) = encoded {
            let _ = self.password_encoder.matches(presented, encoded);
        }
    }
}

impl AuthenticationProvider for DaoAuthenticationProvider {
    fn supports(&self, kind: &TokenKind) -> bool {
        *kind == TokenKind::UsernamePassword
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        if !self.supports(authentication.kind()) {
            return Ok(None);
        }

        let username = authentication.name();
        let presented = match authentication.credentials() {
            Credentials::Password(password) => password.as_str(),
            _ => return Err(AuthError::bad_credentials(BAD_CREDENTIALS)),
        };

        let user = match self.user_details_service.load_user_by_username(username) {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.mitigate_against_timing_attack(presented);
                debug!(username, "User not found");
                return Err(if self.hide_user_not_found {
                    AuthError::bad_credentials(BAD_CREDENTIALS)
                } else {
                    AuthError::bad_credentials(format!("User {} not found", username))
                });
            }
            Err(e) => return Err(AuthError::service("Unable to load user details", e)),
        };

        self.status_checker.pre_check(&user)?;

        if !self.password_encoder.matches(presented, user.get_password()) {
            debug!(username, "Password does not match stored value");
            return Err(AuthError::bad_credentials(BAD_CREDENTIALS));
        }

        self.status_checker.post_check(&user)?;

        let authorities = user.granted_authorities();
        Authentication::proven_from(authentication, user.without_password(), authorities)
            .map(Some)
            .map_err(|_| AuthError::bad_credentials("User has no granted authorities"))
    }

    fn name(&self) -> &str {
        "DaoAuthenticationProvider"
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        vec![
            AuthErrorKind::BadCredentials,
            AuthErrorKind::AccountLocked,
            AuthErrorKind::AccountDisabled,
            AuthErrorKind::AccountExpired,
            AuthErrorKind::CredentialsExpired,
            AuthErrorKind::ProviderUnavailable,
        ]
    }
}
