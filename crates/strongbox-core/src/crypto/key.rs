//! Key derivation using Argon2id.
//!
//! A store has exactly one symmetric key, derived from the user's password
//! and the salt in the store header. No per-field or per-entity sub-keys are
//! derived; per-field uniqueness comes from the random nonce of each seal.

use argon2::Argon2;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, StrongboxError};

/// Argon2id parameters.
///
/// - Memory: 64 MB (64 * 1024 KB)
/// - Iterations: 3
/// - Parallelism: 1
const ARGON2_MEMORY_KB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

/// Length of derived key in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Minimum salt length accepted by [`derive_key`].
pub const MIN_SALT_LENGTH: usize = 16;

/// A symmetric key derived from a password.
///
/// Key material is zeroized when dropped, on success and error paths alike.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Raw key bytes. Never store or log this value.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        // No early exit on the first differing byte.
        self.key
            .iter()
            .zip(other.key.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for DerivedKey {}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the store key from a password and the header salt.
///
/// Deterministic: the same password and salt always give the same key.
/// Rejects an empty password and salts shorter than [`MIN_SALT_LENGTH`], so
/// a key is never derived from salt alone or password alone.
///
/// # Examples
///
/// ```
/// use strongbox_core::crypto::derive_key;
///
/// let salt = b"unique-salt-per-store";
/// let key = derive_key("correct-horse", salt).unwrap();
/// assert_eq!(key, derive_key("correct-horse", salt).unwrap());
/// ```
pub fn derive_key(password: &str, salt: &[u8]) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(StrongboxError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < MIN_SALT_LENGTH {
        return Err(StrongboxError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            MIN_SALT_LENGTH
        )));
    }

    let params = argon2::Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_LENGTH),
    )
    .map_err(|e| StrongboxError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    let derived = argon2
        .hash_password_into(password.as_bytes(), salt, &mut key_bytes)
        .map_err(|e| StrongboxError::Crypto(format!("Key derivation failed: {}", e)))
        .map(|()| DerivedKey::from_bytes(key_bytes));
    key_bytes.zeroize();
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = b"salt-1234567890123456";
        let key1 = derive_key("correct-horse", salt).unwrap();
        let key2 = derive_key("correct-horse", salt).unwrap();
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_different_salts_different_keys() {
        let key1 = derive_key("correct-horse", b"salt-one-1234567890").unwrap();
        let key2 = derive_key("correct-horse", b"salt-two-1234567890").unwrap();
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let salt = b"salt-1234567890123456";
        let key1 = derive_key("password-one", salt).unwrap();
        let key2 = derive_key("password-two", salt).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = derive_key("", b"salt-1234567890123456");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Password cannot be empty"));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key("correct-horse", b"short");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Salt must be at least 16 bytes"));
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let key = derive_key("correct-horse", b"salt-1234567890123456").unwrap();
        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));
        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }

    #[test]
    fn test_derived_key_zeroizes_on_drop() {
        fn assert_zeroize_on_drop<T: ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<DerivedKey>();
    }
}
