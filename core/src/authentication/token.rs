//! Credential tokens.
//!
//! # Spring Equivalent
//! `Authentication` and its implementations
//! (`UsernamePasswordAuthenticationToken`, `RememberMeAuthenticationToken`,
//! `PreAuthenticatedAuthenticationToken`, `AnonymousAuthenticationToken`).
//!
//! A request token is built by whatever extracted the raw credentials (a login
//! form, a cookie, a trusted header). Providers never mutate it: a successful
//! provider builds a new, proven token through [`Authentication::authenticated`]
//! or [`Authentication::proven_from`], which refuse an empty authority set.

use std::collections::BTreeSet;
use std::fmt;

use derive_more::Display;
use serde::Serialize;
use zeroize::Zeroize;

use super::keyed_hash::KeyedHash;
use super::user::User;

/// Authentication scheme of a token, used to dispatch to providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    UsernamePassword,
    RememberMe,
    PreAuthenticated,
    Anonymous,
    Cas,
    /// Scheme contributed by an application-specific provider.
    Custom(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::UsernamePassword => f.write_str("UsernamePasswordAuthenticationToken"),
            TokenKind::RememberMe => f.write_str("RememberMeAuthenticationToken"),
            TokenKind::PreAuthenticated => f.write_str("PreAuthenticatedAuthenticationToken"),
            TokenKind::Anonymous => f.write_str("AnonymousAuthenticationToken"),
            TokenKind::Cas => f.write_str("CasAuthenticationToken"),
            TokenKind::Custom(name) => f.write_str(name),
        }
    }
}

/// A capability granted to an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(transparent)]
pub struct GrantedAuthority(String);

impl GrantedAuthority {
    pub fn new(authority: impl Into<String>) -> Self {
        GrantedAuthority(authority.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GrantedAuthority {
    fn from(value: &str) -> Self {
        GrantedAuthority::new(value)
    }
}

impl From<String> for GrantedAuthority {
    fn from(value: String) -> Self {
        GrantedAuthority(value)
    }
}

/// Identity being authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Name(String),
    User(User),
}

impl Principal {
    /// Identity used for session bookkeeping and logging.
    pub fn name(&self) -> &str {
        match self {
            Principal::Name(name) => name,
            Principal::User(user) => user.get_username(),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Principal::User(user) => Some(user),
            Principal::Name(_) => None,
        }
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Principal::Name(value.to_string())
    }
}

impl From<String> for Principal {
    fn from(value: String) -> Self {
        Principal::Name(value)
    }
}

impl From<User> for Principal {
    fn from(value: User) -> Self {
        Principal::User(value)
    }
}

/// Secret material presented with a request.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    None,
    Password(String),
    /// Keyed hash issued by a remember-me or anonymous filter.
    KeyHash(String),
    /// Service ticket issued by an external authority.
    Ticket(String),
}

impl Credentials {
    pub fn is_present(&self) -> bool {
        !matches!(self, Credentials::None)
    }

    /// Returns the secret, if any.
    pub fn expose_secret(&self) -> Option<&str> {
        match self {
            Credentials::None => None,
            Credentials::Password(s) | Credentials::KeyHash(s) | Credentials::Ticket(s) => Some(s),
        }
    }

    /// Wipes the secret from memory and leaves `Credentials::None`.
    pub fn erase(&mut self) {
        match self {
            Credentials::None => {}
            Credentials::Password(s) | Credentials::KeyHash(s) | Credentials::Ticket(s) => {
                s.zeroize()
            }
        }
        *self = Credentials::None;
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Password(_) => f.write_str("Password([PROTECTED])"),
            Credentials::KeyHash(_) => f.write_str("KeyHash([PROTECTED])"),
            Credentials::Ticket(_) => f.write_str("Ticket([PROTECTED])"),
        }
    }
}

/// Extra request information attached by the token-producing collaborator.
///
/// # Spring Equivalent
/// `WebAuthenticationDetails` /
/// `PreAuthenticatedGrantedAuthoritiesWebAuthenticationDetails`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationDetails {
    remote_address: Option<String>,
    session_id: Option<String>,
    pre_authenticated_roles: Vec<String>,
}

impl AuthenticationDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_address(mut self, address: impl Into<String>) -> Self {
        self.remote_address = Some(address.into());
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Roles asserted by the container for pre-authenticated requests.
    pub fn pre_authenticated_roles(mut self, roles: &[String]) -> Self {
        self.pre_authenticated_roles.extend(roles.iter().cloned());
        self
    }

    pub fn get_remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    pub fn get_session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn get_pre_authenticated_roles(&self) -> &[String] {
        &self.pre_authenticated_roles
    }
}

/// Proven tokens must carry at least one authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenError {
    #[display("An authenticated token requires at least one granted authority")]
    NoAuthorities,
}

impl std::error::Error for TokenError {}

/// An authentication request or a proven authentication result.
///
/// Equality covers kind, principal, credentials, authorities and the
/// authenticated flag; details are ignored.
#[derive(Debug, Clone)]
pub struct Authentication {
    kind: TokenKind,
    principal: Principal,
    credentials: Credentials,
    authorities: BTreeSet<GrantedAuthority>,
    details: Option<AuthenticationDetails>,
    authenticated: bool,
}

impl Authentication {
    /// Creates an unauthenticated request token.
    pub fn request(
        kind: TokenKind,
        principal: impl Into<Principal>,
        credentials: Credentials,
    ) -> Self {
        Self {
            kind,
            principal: principal.into(),
            credentials,
            authorities: BTreeSet::new(),
            details: None,
            authenticated: false,
        }
    }

    /// Username/password login request.
    pub fn username_password(username: &str, password: &str) -> Self {
        Self::request(
            TokenKind::UsernamePassword,
            username,
            Credentials::Password(password.to_string()),
        )
    }

    /// Request for a principal asserted by a trusted upstream (header, container).
    pub fn pre_authenticated(principal: &str, credentials: Credentials) -> Self {
        Self::request(TokenKind::PreAuthenticated, principal, credentials)
    }

    /// Remember-me request for a user restored from a cookie.
    pub fn remember_me(key: &KeyedHash, user: User) -> Self {
        let hash = key.sign(user.get_username());
        Self::request(TokenKind::RememberMe, user, Credentials::KeyHash(hash))
    }

    /// Anonymous request issued by an anonymous-processing filter.
    pub fn anonymous(key: &KeyedHash, principal: &str) -> Self {
        let hash = key.sign(principal);
        Self::request(TokenKind::Anonymous, principal, Credentials::KeyHash(hash))
    }

    /// Attaches request details (builder pattern).
    pub fn with_details(mut self, details: AuthenticationDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a proven token. Fails when `authorities` is empty.
    pub fn authenticated<I, A>(
        kind: TokenKind,
        principal: impl Into<Principal>,
        credentials: Credentials,
        authorities: I,
    ) -> Result<Self, TokenError>
    where
        I: IntoIterator<Item = A>,
        A: Into<GrantedAuthority>,
    {
        let authorities: BTreeSet<GrantedAuthority> =
            authorities.into_iter().map(Into::into).collect();
        if authorities.is_empty() {
            return Err(TokenError::NoAuthorities);
        }
        Ok(Self {
            kind,
            principal: principal.into(),
            credentials,
            authorities,
            details: None,
            authenticated: true,
        })
    }

    /// Proven token for `request`, keeping its kind, credentials and details.
    pub fn proven_from<I, A>(
        request: &Authentication,
        principal: impl Into<Principal>,
        authorities: I,
    ) -> Result<Self, TokenError>
    where
        I: IntoIterator<Item = A>,
        A: Into<GrantedAuthority>,
    {
        let mut proven = Self::authenticated(
            request.kind.clone(),
            principal,
            request.credentials.clone(),
            authorities,
        )?;
        proven.details = request.details.clone();
        Ok(proven)
    }

    /// Returns this token with its credentials wiped.
    pub fn without_credentials(mut self) -> Self {
        self.credentials.erase();
        self
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Name of the principal.
    pub fn name(&self) -> &str {
        self.principal.name()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn authorities(&self) -> &BTreeSet<GrantedAuthority> {
        &self.authorities
    }

    pub fn details(&self) -> Option<&AuthenticationDetails> {
        self.details.as_ref()
    }

    /// Session id from the details, if the request carried one.
    pub fn session_id(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.get_session_id())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a.as_str() == authority)
    }
}

impl PartialEq for Authentication {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.principal == other.principal
            && self.credentials == other.credentials
            && self.authorities == other.authorities
            && self.authenticated == other.authenticated
    }
}

impl Eq for Authentication {}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authorities: Vec<&str> = self.authorities.iter().map(|a| a.as_str()).collect();
        write!(
            f,
            "{}: Principal: {}; Credentials: [PROTECTED]; Authenticated: {}; Granted Authorities: {}",
            self.kind,
            self.name(),
            self.authenticated,
            authorities.join(", ")
        )
    }
}
