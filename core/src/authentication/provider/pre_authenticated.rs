//! Trusts a principal already asserted by an upstream system (reverse proxy
//! header, servlet container, client certificate).
//!
//! # Spring Equivalent
//! `PreAuthenticatedAuthenticationProvider`,
//! `PreAuthenticatedGrantedAuthoritiesUserDetailsService` and
//! `SimpleAttributes2GrantedAuthoritiesMapper`

use std::sync::Arc;

use tracing::debug;

use crate::authentication::token::{Authentication, GrantedAuthority, TokenKind};
use crate::authentication::user::{User, ROLE_PREFIX};
use crate::authentication::user_details::{AccountStatusChecker, UserDetailsService};
use crate::error::{AuthError, AuthErrorKind, ConfigurationError};

use super::AuthenticationProvider;

// =============================================================================
// Role Mapping
// =============================================================================

/// Turns container role names into granted authorities.
#[derive(Debug, Clone)]
pub struct RoleAuthorityMapper {
    prefix: String,
    convert_to_upper_case: bool,
    mappable_roles: Option<Vec<String>>,
}

impl Default for RoleAuthorityMapper {
    fn default() -> Self {
        Self {
            prefix: ROLE_PREFIX.to_string(),
            convert_to_upper_case: false,
            mappable_roles: None,
        }
    }
}

impl RoleAuthorityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn convert_to_upper_case(mut self, upper: bool) -> Self {
        self.convert_to_upper_case = upper;
        self
    }

    /// Only these container roles are mapped; others are ignored.
    pub fn mappable_roles(mut self, roles: &[String]) -> Self {
        self.mappable_roles = Some(roles.to_vec());
        self
    }

    pub fn map(&self, roles: &[String]) -> Vec<GrantedAuthority> {
        roles
            .iter()
            .filter(|role| match &self.mappable_roles {
                Some(allowed) => allowed.contains(role),
                None => true,
            })
            .map(|role| {
                let role = if self.convert_to_upper_case {
                    role.to_uppercase()
                } else {
                    role.clone()
                };
                if role.starts_with(&self.prefix) {
                    GrantedAuthority::new(role)
                } else {
                    GrantedAuthority::new(format!("{}{}", self.prefix, role))
                }
            })
            .collect()
    }
}

// =============================================================================
// Provider
// =============================================================================

enum UserSource {
    UserDetails(Arc<dyn UserDetailsService>),
    ContainerRoles(RoleAuthorityMapper),
}

/// Resolves the asserted principal to a user and grants its authorities.
///
/// No credentials are checked: the upstream system is trusted to have done so.
pub struct PreAuthenticatedAuthenticationProvider {
    source: UserSource,
    status_checker: AccountStatusChecker,
}

impl PreAuthenticatedAuthenticationProvider {
    pub fn builder() -> PreAuthenticatedProviderBuilder {
        PreAuthenticatedProviderBuilder::default()
    }

    fn resolve_user(&self, authentication: &Authentication) -> Result<User, AuthError> {
        let name = authentication.name();
        match &self.source {
            UserSource::UserDetails(service) => match service.load_user_by_username(name) {
                Ok(Some(user)) => Ok(user),
                Ok(None) => Err(AuthError::bad_credentials(format!(
                    "No user found for pre-authenticated principal {}",
                    name
                ))),
                Err(e) => Err(AuthError::service("Unable to load user details", e)),
            },
            UserSource::ContainerRoles(mapper) => {
                let roles = authentication
                    .details()
                    .map(|details| details.get_pre_authenticated_roles())
                    .unwrap_or_default();
                let authorities: Vec<String> = mapper
                    .map(roles)
                    .into_iter()
                    .map(|authority| authority.as_str().to_string())
                    .collect();
                Ok(User::new(name.to_string(), String::new()).authorities(&authorities))
            }
        }
    }
}

impl AuthenticationProvider for PreAuthenticatedAuthenticationProvider {
    fn supports(&self, kind: &TokenKind) -> bool {
        *kind == TokenKind::PreAuthenticated
    }

    fn authenticate(
        &self,
        authentication: &Authentication,
    ) -> Result<Option<Authentication>, AuthError> {
        if !self.supports(authentication.kind()) {
            return Ok(None);
        }

        if authentication.name().trim().is_empty() {
            debug!("No pre-authenticated principal found in request");
            return Err(AuthError::bad_credentials(
                "No pre-authenticated principal found in request",
            ));
        }

        let user = self.resolve_user(authentication)?;
        self.status_checker.check(&user)?;

        let authorities = user.granted_authorities();
        Authentication::proven_from(authentication, user.without_password(), authorities)
            .map(Some)
            .map_err(|_| {
                AuthError::bad_credentials("Pre-authenticated principal has no granted authorities")
            })
    }

    fn name(&self) -> &str {
        "PreAuthenticatedAuthenticationProvider"
    }

    fn declared_errors(&self) -> Vec<AuthErrorKind> {
        let mut kinds = vec![
            AuthErrorKind::BadCredentials,
            AuthErrorKind::AccountLocked,
            AuthErrorKind::AccountDisabled,
            AuthErrorKind::AccountExpired,
            AuthErrorKind::CredentialsExpired,
        ];
        if matches!(self.source, UserSource::UserDetails(_)) {
            kinds.push(AuthErrorKind::ProviderUnavailable);
        }
        kinds
    }
}

/// Builder for [`PreAuthenticatedAuthenticationProvider`].
#[derive(Default)]
pub struct PreAuthenticatedProviderBuilder {
    source: Option<UserSource>,
}

impl PreAuthenticatedProviderBuilder {
    /// Load the asserted principal from an identity store.
    pub fn user_details_service<S: UserDetailsService + 'static>(mut self, service: S) -> Self {
        self.source = Some(UserSource::UserDetails(Arc::new(service)));
        self
    }

    /// Grant the roles the upstream system attached to the request details.
    pub fn container_roles(mut self, mapper: RoleAuthorityMapper) -> Self {
        self.source = Some(UserSource::ContainerRoles(mapper));
        self
    }

    pub fn build(self) -> Result<PreAuthenticatedAuthenticationProvider, ConfigurationError> {
        let source = self
            .source
            .ok_or(ConfigurationError::MissingCollaborator("A pre-authenticated user source"))?;
        Ok(PreAuthenticatedAuthenticationProvider {
            source,
            status_checker: AccountStatusChecker,
        })
    }
}
