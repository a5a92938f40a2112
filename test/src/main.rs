//! Authentication Chain Demo Application
//!
//! Wires a `ProviderManager` with password, remember-me and anonymous
//! providers behind a session limit, then replays a few login attempts.
//! Set `RUST_LOG=debug` to follow each provider attempt.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use authn_chain_core::authentication::{
    AnonymousAuthenticationProvider, Argon2PasswordEncoder, Authentication, AuthenticationDetails,
    ConcurrencyConfig, DaoAuthenticationProvider, EventMulticaster, InMemoryEventStore,
    InMemoryUserDetailsService, LoggingEventListener, MaximumSessionsController, PasswordEncoder,
    ProviderManager, RememberMeAuthenticationProvider, User,
};

const CONFIG: &str = r#"{
    "concurrency": { "maximum_sessions": 1, "exception_if_maximum_exceeded": true },
    "users": [
        { "username": "admin", "password": "admin", "roles": ["ADMIN", "USER"] },
        { "username": "user", "password": "user", "roles": ["USER"] }
    ]
}"#;

#[derive(Deserialize)]
struct DemoConfig {
    concurrency: ConcurrencyConfig,
    users: Vec<DemoUser>,
}

#[derive(Deserialize)]
struct DemoUser {
    username: String,
    password: String,
    roles: Vec<String>,
}

/// Creates the user store with Argon2-encoded passwords.
///
/// # Spring Security Equivalent
/// ```java
/// @Bean
/// public UserDetailsService userDetailsService(PasswordEncoder encoder) {
///     return new InMemoryUserDetailsManager(
///         User.withUsername("admin").password(encoder.encode("admin")).roles("ADMIN", "USER").build(),
///         User.withUsername("user").password(encoder.encode("user")).roles("USER").build()
///     );
/// }
/// ```
fn user_details_service(
    users: &[DemoUser],
    encoder: &Argon2PasswordEncoder,
) -> Result<InMemoryUserDetailsService, Box<dyn std::error::Error>> {
    let service = InMemoryUserDetailsService::new();
    for user in users {
        service.add_user(
            User::with_encoded_password(&user.username, encoder.encode(&user.password)?)
                .roles(&user.roles),
        );
    }
    Ok(service)
}

fn random_key() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: DemoConfig = serde_json::from_str(CONFIG)?;
    config.concurrency.validate()?;

    let encoder = Argon2PasswordEncoder::new();
    let users = user_details_service(&config.users, &encoder)?;

    let remember_me = RememberMeAuthenticationProvider::new(&random_key())?;
    let remember_me_key = remember_me.get_key().clone();
    let anonymous = AnonymousAuthenticationProvider::new(&random_key())?;
    let anonymous_key = anonymous.get_key().clone();

    let audit = InMemoryEventStore::new();
    let manager = ProviderManager::builder()
        .provider(DaoAuthenticationProvider::new(users).password_encoder(encoder))
        .provider(remember_me)
        .provider(anonymous)
        .session_controller(MaximumSessionsController::new(config.concurrency)?)
        .event_publisher(
            EventMulticaster::new()
                .add_listener(LoggingEventListener::new())
                .add_listener(audit.clone()),
        )
        .build()?;

    let attempts = vec![
        Authentication::username_password("admin", "admin")
            .with_details(AuthenticationDetails::new().session_id("browser-1")),
        Authentication::username_password("user", "wrong"),
        Authentication::username_password("admin", "admin")
            .with_details(AuthenticationDetails::new().session_id("browser-2")),
        Authentication::remember_me(
            &remember_me_key,
            User::new("user".into(), String::new()).roles(&["USER".into()]),
        ),
        Authentication::anonymous(&anonymous_key, "anonymousUser"),
    ];

    for attempt in &attempts {
        match manager.authenticate(attempt) {
            Ok(result) => info!("{}", result),
            Err(err) if err.is_configuration_error() => {
                error!(error = %err, "Authentication chain misconfigured");
                return Err(err.into());
            }
            Err(err) => info!(principal = attempt.name(), error = %err, "Login rejected"),
        }
    }

    for event in audit.get_events() {
        println!("{}", event.to_json());
    }
    Ok(())
}
