//! # authn-chain-core
//!
//! Ordered authentication-provider chain with concurrent-session admission
//! control and failure-to-event mapping.
//!
//! # Spring Equivalent
//! `ProviderManager` together with its `AuthenticationProvider`,
//! `ConcurrentSessionController` and `ApplicationEventPublisher` collaborators.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use authn_chain_core::authentication::{
//!     Authentication, DaoAuthenticationProvider, InMemoryUserDetailsService, ProviderManager,
//!     User,
//! };
//!
//! let users = InMemoryUserDetailsService::with_users(vec![
//!     User::new("alice".into(), "secret".into()).roles(&["USER".into()]),
//! ]);
//! let manager = ProviderManager::builder()
//!     .provider(DaoAuthenticationProvider::new(Arc::new(users)))
//!     .build()
//!     .unwrap();
//!
//! let result = manager
//!     .authenticate(&Authentication::username_password("alice", "secret"))
//!     .unwrap();
//! assert!(result.is_authenticated());
//! assert!(result.has_authority("ROLE_USER"));
//! ```
//!
//! ## Modules
//!
//! - [`authentication`] - Tokens, providers, session admission, events and the manager
//! - [`error`] - Authentication and configuration error types

pub mod authentication;
pub mod error;
