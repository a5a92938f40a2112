//! Password Encoder tests.
//!
//! Tests for Argon2 and the delegating encoder.

use authn_chain_core::authentication::{
    Argon2PasswordEncoder, DelegatingPasswordEncoder, PasswordEncoder,
};

#[test]
fn test_argon2_password_encoder() {
    let encoder = Argon2PasswordEncoder::new();
    let password = "test_password_123";

    let hash = encoder.encode(password).unwrap();

    // Hash should not equal plain password
    assert_ne!(hash, password);

    // Should verify correctly
    assert!(encoder.matches(password, &hash));
    assert!(!encoder.matches("wrong_password", &hash));
}

#[test]
fn test_password_hashes_are_different() {
    let encoder = Argon2PasswordEncoder::new();
    let password = "same_password";

    let hash1 = encoder.encode(password).unwrap();
    let hash2 = encoder.encode(password).unwrap();

    // Different salts should produce different hashes
    assert_ne!(hash1, hash2);

    assert!(encoder.matches(password, &hash1));
    assert!(encoder.matches(password, &hash2));
}

#[test]
fn test_delegating_encoder_migrates_noop() {
    let encoder = DelegatingPasswordEncoder::new();

    assert!(encoder.matches("legacy", "{noop}legacy"));
    assert!(encoder.upgrade_encoding("{noop}legacy"));

    let upgraded = encoder.encode("legacy").unwrap();
    assert!(upgraded.starts_with("{argon2}"));
    assert!(encoder.matches("legacy", &upgraded));
    assert!(!encoder.upgrade_encoding(&upgraded));

    assert!(!encoder.matches("legacy", "{bcrypt}whatever"));
}
