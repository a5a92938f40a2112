//! User model carried as the principal of proven tokens.
//!
//! # Spring Equivalent
//! `UserDetails` interface / `User`

use std::fmt;

use super::token::GrantedAuthority;

/// Prefix applied to roles when they are turned into granted authorities.
pub const ROLE_PREFIX: &str = "ROLE_";

/// A user with roles, authorities and account status.
///
/// # Spring Equivalent
/// `UserDetails` / `User`
///
/// # Example
/// ```
/// use authn_chain_core::authentication::User;
///
/// let user = User::new("admin".into(), "password".into())
///     .roles(&["ADMIN".into(), "USER".into()])
///     .authorities(&["users:read".into(), "users:write".into()]);
///
/// assert!(user.has_role("ADMIN"));
/// assert!(user.has_authority("users:read"));
/// assert!(user.is_enabled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    username: String,
    password: String,
    roles: Vec<String>,
    authorities: Vec<String>,
    enabled: bool,
    account_non_expired: bool,
    account_non_locked: bool,
    credentials_non_expired: bool,
}

impl User {
    /// Creates an enabled, unlocked, non-expired user.
    pub fn new(username: String, password: String) -> Self {
        User {
            username,
            password,
            roles: Vec::new(),
            authorities: Vec::new(),
            enabled: true,
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
        }
    }

    /// Creates a user whose password is already encoded.
    ///
    /// # Example
    /// ```
    /// use authn_chain_core::authentication::{User, NoOpPasswordEncoder, PasswordEncoder};
    ///
    /// let encoded = NoOpPasswordEncoder.encode("secret").unwrap();
    /// let user = User::with_encoded_password("admin", encoded).roles(&["ADMIN".into()]);
    /// assert_eq!(user.get_password(), "secret");
    /// ```
    pub fn with_encoded_password(username: &str, encoded_password: String) -> Self {
        User::new(username.to_string(), encoded_password)
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }

    pub fn get_roles(&self) -> &[String] {
        &self.roles
    }

    pub fn get_authorities(&self) -> &[String] {
        &self.authorities
    }

    /// Adds roles to the user (builder pattern).
    pub fn roles(mut self, roles: &[String]) -> Self {
        for role in roles {
            if !self.roles.contains(role) {
                self.roles.push(role.clone());
            }
        }
        self
    }

    /// Adds authorities to the user (builder pattern).
    pub fn authorities(mut self, authorities: &[String]) -> Self {
        for authority in authorities {
            if !self.authorities.contains(authority) {
                self.authorities.push(authority.clone());
            }
        }
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn account_expired(mut self, expired: bool) -> Self {
        self.account_non_expired = !expired;
        self
    }

    pub fn account_locked(mut self, locked: bool) -> Self {
        self.account_non_locked = !locked;
        self
    }

    pub fn credentials_expired(mut self, expired: bool) -> Self {
        self.credentials_non_expired = !expired;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_account_non_expired(&self) -> bool {
        self.account_non_expired
    }

    pub fn is_account_non_locked(&self) -> bool {
        self.account_non_locked
    }

    pub fn is_credentials_non_expired(&self) -> bool {
        self.credentials_non_expired
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// Roles as `ROLE_`-prefixed authorities followed by plain authorities.
    pub fn granted_authorities(&self) -> Vec<GrantedAuthority> {
        self.roles
            .iter()
            .map(|role| {
                if role.starts_with(ROLE_PREFIX) {
                    GrantedAuthority::new(role.clone())
                } else {
                    GrantedAuthority::new(format!("{}{}", ROLE_PREFIX, role))
                }
            })
            .chain(self.authorities.iter().cloned().map(GrantedAuthority::new))
            .collect()
    }

    /// Copy of this user without the password, for storing in proven tokens.
    pub fn without_password(&self) -> Self {
        User {
            password: String::new(),
            ..self.clone()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User {{ username: {}, roles: {:?}, authorities: {:?}, enabled: {} }}",
            self.username, self.roles, self.authorities, self.enabled
        )
    }
}
