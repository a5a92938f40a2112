//! Authentication decision core.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.authentication` and
//! `org.springframework.security.concurrent`
//!
//! # Module Structure
//!
//! - `token` - Request and proven tokens (`Authentication`, `TokenKind`, `Credentials`)
//! - `provider` - `AuthenticationProvider` trait and the reference providers
//! - `session` - Concurrent-session admission control and the session registry
//! - `event` - Authentication events and publishers
//! - `mapping` - Failure kind to event table
//! - `manager` - `ProviderManager`, the provider chain coordinator
//! - `user` - User model
//! - `user_details` - User lookup and account-status checks
//! - `crypto` - Password encoding (Argon2, NoOp, Delegating)
//! - `keyed_hash` - HMAC key hashes for remember-me and anonymous tokens
//!
//! # Feature Flags
//! - `argon2`: Enables `Argon2PasswordEncoder` and `DelegatingPasswordEncoder`

// Re-exports for convenience
#[cfg(feature = "argon2")]
pub use crypto::{Argon2PasswordEncoder, DelegatingPasswordEncoder};
pub use crypto::{EncodingError, NoOpPasswordEncoder, PasswordEncoder};
pub use event::{
    AuthenticationEvent, AuthenticationEventPublisher, AuthenticationEventType,
    ClosureEventListener, EventMulticaster, InMemoryEventStore, LoggingEventListener,
};
pub use keyed_hash::KeyedHash;
pub use manager::{ProviderManager, ProviderManagerBuilder};
pub use mapping::{EventFactory, ExceptionMappings};
pub use provider::{
    AnonymousAuthenticationProvider, AuthenticationProvider, DaoAuthenticationProvider,
    PreAuthenticatedAuthenticationProvider, PreAuthenticatedProviderBuilder,
    RememberMeAuthenticationProvider, RoleAuthorityMapper,
};
pub use session::{
    ConcurrencyConfig, ConcurrentSessionController, MaximumSessionsController,
    NullConcurrentSessionController, SessionInformation, SessionRegistry,
};
pub use token::{
    Authentication, AuthenticationDetails, Credentials, GrantedAuthority, Principal, TokenError,
    TokenKind,
};
pub use user::User;
pub use user_details::{
    AccountStatusChecker, CachingUserDetailsService, InMemoryUserDetailsService,
    UserDetailsError, UserDetailsService,
};

pub mod crypto;
pub mod event;
pub mod keyed_hash;
pub mod manager;
pub mod mapping;
pub mod provider;
pub mod session;
pub mod token;
pub mod user;
pub mod user_details;
