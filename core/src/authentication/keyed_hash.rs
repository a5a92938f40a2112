//! Keyed hashes binding a principal name to a shared server-side key.
//!
//! Remember-me and anonymous tokens carry `base64(HMAC-SHA256(key, principal))`
//! instead of a password. A provider configured with the same key recomputes it
//! and compares in constant time.

use std::fmt;

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::ConfigurationError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 keyed with a deployment secret.
#[derive(Clone)]
pub struct KeyedHash {
    mac: HmacSha256,
}

impl KeyedHash {
    /// Creates a keyed hash; the key must not be empty.
    pub fn new(key: &str) -> Result<Self, ConfigurationError> {
        if key.is_empty() {
            return Err(ConfigurationError::InvalidSetting {
                name: "key",
                reason: "a non-empty key is required".to_string(),
            });
        }
        let mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| {
            ConfigurationError::InvalidSetting {
                name: "key",
                reason: e.to_string(),
            }
        })?;
        Ok(Self { mac })
    }

    /// Computes the hash presented by tokens issued for `principal`.
    pub fn sign(&self, principal: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(principal.as_bytes());
        BASE64_STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a presented hash.
    pub fn verify(&self, principal: &str, presented: &str) -> bool {
        let expected = self.sign(principal);
        expected.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Debug for KeyedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyedHash([PROTECTED])")
    }
}
