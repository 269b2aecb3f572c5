//! Cryptographic building blocks for Strongbox.
//!
//! Built on well-audited RustCrypto crates:
//! - **Argon2id**: memory-hard password-based key derivation
//! - **AES-256-GCM** / **XChaCha20-Poly1305**: authenticated field encryption
//!
//! ## Security Model
//!
//! - One key per store, derived from password + header salt
//! - Every field sealed separately with a fresh random nonce
//! - Key material and recovered plaintext zeroized on drop
//! - No plaintext passwords stored
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted store
//! - Offline brute-force attacks on the password
//! - Tampering with any stored field
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked store in memory

pub mod cipher;
pub mod key;
pub mod passphrase;
pub mod sealed;

pub use cipher::{AeadFieldCipher, FieldCipher};
pub use key::{derive_key, DerivedKey};
pub use passphrase::validate_password;
pub use sealed::SealedField;
