//! Validates anonymous tokens issued by the anonymous-processing filter.
//!
//! # Spring Equivalent
//! `AnonymousAuthenticationProvider`

use crate::authentication::keyed_hash::KeyedHash;
use crate::authentication::token::{Authentication, Credentials, GrantedAuthority, TokenKind};
use crate::error::{AuthError, AuthErrorKind, ConfigurationError};

use super::AuthenticationProvider;

const KEY_MISMATCH: &str =
    "The presented AnonymousAuthenticationToken does not contain the expected key";

/// Grants a fixed set of authorities (default `ROLE_ANONYMOUS`) to anonymous
/// tokens carrying the expected key hash.
#[derive(Debug)]
pub struct AnonymousAuthenticationProvider {
    key: KeyedHash,
    authorities: Vec<GrantedAuthority>,
}

impl AnonymousAuthenticationProvider {
    pub fn new(key: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            key: KeyedHash::new(key)?,
            authorities: vec![GrantedAuthority::new("ROLE_ANONYMOUS")],
        })
    }

    /// Replaces the granted authorities. An empty list is rejected.
    pub fn with_authorities(
        key: &str,
        authorities: &[String],
    ) -> Result<Self, ConfigurationError> {
        if authorities.is_empty() {
            return Err(ConfigurationError::InvalidSetting {
                name: "authorities",
                reason: "anonymous users need at least one authority".into(),
            });
        }
        let mut provider = Self::new(key)?;
        provider.authorities = authorities.iter().cloned().map(GrantedAuthority::new).collect();
        Ok(provider)
    }

    pub fn get_key(&self) -> &KeyedHash {
        &self.key
    }

    pub fn get_authorities(&self) -> &[GrantedAuthority] {
        &self.authorities
    }
}

impl AuthenticationProvider for AnonymousAuthenticationProvider {
    fn supports(&self, kind: &TokenKind) -> bool {
        *kind == TokenKind::Anonymous
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        if !self.supports(authentication.kind()) {
            return Ok(None);
        }

        let valid = match authentication.credentials() {
            Credentials::KeyHash(hash) => self.key.verify(authentication.name(), hash),
            _ => false,
        };
        if !valid {
            return Err(AuthError::bad_credentials(KEY_MISMATCH));
        }

        Authentication::proven_from(
            authentication,
            authentication.principal().clone(),
            self.authorities.iter().cloned(),
        )
        .map(Some)
        .map_err(|_| AuthError::bad_credentials("Anonymous token has no granted authorities"))
    }

    fn name(&self) -> &str {
        "AnonymousAuthenticationProvider"
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        vec![AuthErrorKind::BadCredentials]
    }
}
