//! Loading users from an identity store.
//!
//! # Spring Security Equivalent
//! `UserDetailsService`, `InMemoryUserDetailsManager`, `UserCache` and
//! `AccountStatusUserDetailsChecker`.
//!
//! Lookups are synchronous: providers run on the caller's thread and may block
//! on the store for the duration of a decision.
//!
//! # Example
//! ```
//! use authn_chain_core::authentication::{InMemoryUserDetailsService, User, UserDetailsService};
//!
//! let service = InMemoryUserDetailsService::new();
//! service.add_user(User::new("alice".into(), "secret".into()));
//!
//! assert!(service.load_user_by_username("alice").unwrap().is_some());
//! assert!(service.load_user_by_username("bob").unwrap().is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_more::Display;
use parking_lot::RwLock;

use super::user::User;
use crate::error::AuthError;

// =============================================================================
// User Details Error
// =============================================================================

/// Errors raised by an identity store.
#[derive(Debug, Clone, Display)]
pub enum UserDetailsError {
    #[display("User already exists")]
    AlreadyExists,
    #[display("User not found")]
    NotFound,
    /// The backing store failed (network, database, directory).
    #[display("Storage error: {_0}")]
    StorageError(String),
}

impl std::error::Error for UserDetailsError {}

// =============================================================================
// User Details Service Trait
// =============================================================================

/// Loads users by name from any data source.
///
/// Returns `Ok(None)` when the user does not exist and `Err` only when the
/// store itself failed.
pub trait UserDetailsService: Send + Sync {
    fn load_user_by_username(&self, username: &str) -> Result<Option<User>, UserDetailsError>;

    fn user_exists(&self, username: &str) -> Result<bool, UserDetailsError> {
        Ok(self.load_user_by_username(username)?.is_some())
    }
}

impl<S: UserDetailsService + ?Sized> UserDetailsService for Arc<S> {
    fn load_user_by_username(&self, username: &str) -> Result<Option<User>, UserDetailsError> {
        (**self).load_user_by_username(username)
    }
}

// =============================================================================
// In-Memory User Details Service
// =============================================================================

/// In-memory user store. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryUserDetailsService {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserDetailsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let service = Self::new();
        service.add_users(users);
        service
    }

    /// Adds or replaces a user.
    pub fn add_user(&self, user: User) {
        self.users
            .write()
            .insert(user.get_username().to_string(), user);
    }

    pub fn add_users(&self, users: Vec<User>) {
        let mut store = self.users.write();
        for user in users {
            store.insert(user.get_username().to_string(), user);
        }
    }

    /// Adds a user, failing if the name is taken.
    pub fn create_user(&self, user: User) -> Result<(), UserDetailsError> {
        let mut users = self.users.write();
        let username = user.get_username().to_string();
        if users.contains_key(&username) {
            return Err(UserDetailsError::AlreadyExists);
        }
        users.insert(username, user);
        Ok(())
    }

    pub fn delete_user(&self, username: &str) -> Result<(), UserDetailsError> {
        match self.users.write().remove(username) {
            Some(_) => Ok(()),
            None => Err(UserDetailsError::NotFound),
        }
    }
}

impl UserDetailsService for InMemoryUserDetailsService {
    fn load_user_by_username(&self, username: &str) -> Result<Option<User>, UserDetailsError> {
        Ok(self.users.read().get(username).cloned())
    }
}

// =============================================================================
// Caching User Details Service
// =============================================================================

struct CachedUser {
    user: User,
    cached_at: Instant,
}

/// Caches users loaded by an inner service for a fixed time-to-live.
///
/// # Spring Security Equivalent
/// `UserCache` as used by `DaoAuthenticationProvider`
pub struct CachingUserDetailsService<S> {
    inner: S,
    cache: RwLock<HashMap<String, CachedUser>>,
    ttl: Duration,
}

impl<S: UserDetailsService> CachingUserDetailsService<S> {
    /// Default TTL is five minutes.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(300),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn invalidate(&self, username: &str) {
        self.cache.write().remove(username);
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

impl<S: UserDetailsService> UserDetailsService for CachingUserDetailsService<S> {
    fn load_user_by_username(&self, username: &str) -> Result<Option<User>, UserDetailsError> {
        if let Some(cached) = self.cache.read().get(username) {
            if cached.cached_at.elapsed() < self.ttl {
                return Ok(Some(cached.user.clone()));
            }
        }

        let result = self.inner.load_user_by_username(username)?;
        if let Some(ref user) = result {
            self.cache.write().insert(
                username.to_string(),
                CachedUser {
                    user: user.clone(),
                    cached_at: Instant::now(),
                },
            );
        }
        Ok(result)
    }
}

// =============================================================================
// Account Status Checks
// =============================================================================

/// Rejects locked, disabled, expired accounts and expired credentials.
///
/// # Spring Security Equivalent
/// `AccountStatusUserDetailsChecker` (pre and post authentication checks)
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountStatusChecker;

impl AccountStatusChecker {
    /// Checks run before credentials are compared.
    pub fn pre_check(&self, user: &User) -> Result<(), AuthError> {
        if !user.is_account_non_locked() {
            return Err(AuthError::locked("User account is locked"));
        }
        if !user.is_enabled() {
            return Err(AuthError::disabled("User is disabled"));
        }
        if !user.is_account_non_expired() {
            return Err(AuthError::account_expired("User account has expired"));
        }
        Ok(())
    }

    /// Checks run once the credentials were accepted.
    pub fn post_check(&self, user: &User) -> Result<(), AuthError> {
        if !user.is_credentials_non_expired() {
            return Err(AuthError::credentials_expired(
                "User credentials have expired",
            ));
        }
        Ok(())
    }

    pub fn check(&self, user: &User) -> Result<(), AuthError> {
        self.pre_check(user)?;
        self.post_check(user)
    }
}
