//! Validates remember-me tokens restored from a cookie.
//!
//! # Spring Equivalent
//! `RememberMeAuthenticationProvider`

use crate::authentication::keyed_hash::KeyedHash;
use crate::authentication::token::{Authentication, Credentials, TokenKind};
use crate::error::{AuthError, AuthErrorKind, ConfigurationError};

use super::AuthenticationProvider;

const KEY_MISMATCH: &str =
    "The presented RememberMeAuthenticationToken does not contain the expected key";

/// Accepts remember-me tokens whose key hash was produced with the same key.
///
/// The user carried by the token was already loaded by the remember-me
/// service, so its authorities are granted as-is.
#[derive(Debug)]
pub struct RememberMeAuthenticationProvider {
    key: KeyedHash,
}

impl RememberMeAuthenticationProvider {
    pub fn new(key: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            key: KeyedHash::new(key)?,
        })
    }

    pub fn from_keyed_hash(key: KeyedHash) -> Self {
        Self { key }
    }

    pub fn get_key(&self) -> &KeyedHash {
        &self.key
    }
}

impl AuthenticationProvider for RememberMeAuthenticationProvider {
    fn supports(&self, kind: &TokenKind) -> bool {
        *kind == TokenKind::RememberMe
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        if !self.supports(authentication.kind()) {
            return Ok(None);
        }

        let presented = match authentication.credentials() {
            Credentials::KeyHash(hash) => hash,
            _ => return Err(AuthError::bad_credentials(KEY_MISMATCH)),
        };
        if !self.key.verify(authentication.name(), presented) {
            return Err(AuthError::bad_credentials(KEY_MISMATCH));
        }

        let authorities = authentication
            .principal()
            .as_user()
            .map(|user| user.granted_authorities())
            .unwrap_or_default();

        Authentication::proven_from(authentication, authentication.principal().clone(), authorities)
            .map(Some)
            .map_err(|_| AuthError::bad_credentials("Remember-me user has no granted authorities"))
    }

    fn name(&self) -> &str {
        "RememberMeAuthenticationProvider"
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        vec![AuthErrorKind::BadCredentials]
    }
}
