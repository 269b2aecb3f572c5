//! Encryption/decryption engine.
//!
//! The engine converts a cleartext [`Database`] into an [`EncryptedDatabase`]
//! and back. It owns no state: every call derives the store key from the
//! password and the header salt, walks the whole tree, and drops (zeroizes)
//! the key before returning, on success and on error.
//!
//! ## Algorithms
//!
//! The set of algorithms is closed. [`Engine::for_header`] is the single
//! dispatch site from the header's algorithm tag to an implementation:
//!
//! | Header tag           | Engine                      | Nonce    |
//! |----------------------|-----------------------------|----------|
//! | `AES-256-GCM`        | [`Engine::Aes256Gcm`]       | 96 bits  |
//! | `XCHACHA20-POLY1305` | `Engine::XChaCha20Poly1305` | 192 bits |
//!
//! The XChaCha20-Poly1305 engine is compiled only with the `xchacha`
//! feature; without it such stores fail with `UnsupportedAlgorithm`.
//!
//! ## Walk order
//!
//! Root first, then the content collection in stored order, depth first
//! into folders. Decryption mirrors the same order, so the first field whose
//! tag fails aborts the call and no partial database is ever returned.
//!
//! ## Binding
//!
//! Each content field's associated data names the store id, the item's
//! position in the tree and the field label. The key check's associated
//! data covers the header, the root record, the biometrics flag and the
//! tree shape. A blob moved to another slot, a dropped or reordered item, or
//! an edited cleartext root all fail authentication.

mod binding;
mod open;
mod seal;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::Aes256Gcm;

use crate::crypto::{derive_key, AeadFieldCipher, DerivedKey};
use crate::error::{Result, StrongboxError};
use crate::header::{EncryptionAlgorithm, Header};
use crate::model::{Database, EncryptedDatabase};

use open::Opener;
use seal::Sealer;

/// Field labels, bound into the associated data of each seal.
pub(crate) mod label {
    pub const KEY_CHECK: &str = "key";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const ICON_NAME: &str = "icon_name";
    pub const CREATED: &str = "created";
    pub const LAST_EDITED: &str = "last_edited";
    pub const ID: &str = "id";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const URL: &str = "url";
    pub const NOTES: &str = "notes";
    pub const DOC_TYPE: &str = "type";
    pub const CONTENT: &str = "content";
    pub const FORMAT: &str = "format";
    pub const QUALITY: &str = "quality";
    pub const DATA: &str = "data";
}

/// One implementation per supported [`EncryptionAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Aes256Gcm,
    #[cfg(feature = "xchacha")]
    XChaCha20Poly1305,
}

impl Engine {
    /// Pick the engine for a store header.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` if this build has no engine for the header's
    /// algorithm.
    pub fn for_header(header: &Header) -> Result<Self> {
        Self::for_algorithm(header.algorithm())
    }

    pub fn for_algorithm(algorithm: EncryptionAlgorithm) -> Result<Self> {
        match algorithm {
            EncryptionAlgorithm::Aes256Gcm => Ok(Engine::Aes256Gcm),
            #[cfg(feature = "xchacha")]
            EncryptionAlgorithm::XChaCha20Poly1305 => Ok(Engine::XChaCha20Poly1305),
            #[allow(unreachable_patterns)]
            other => Err(StrongboxError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        match self {
            Engine::Aes256Gcm => EncryptionAlgorithm::Aes256Gcm,
            #[cfg(feature = "xchacha")]
            Engine::XChaCha20Poly1305 => EncryptionAlgorithm::XChaCha20Poly1305,
        }
    }

    /// Length of the nonce prefix of every sealed field.
    pub fn nonce_len(&self) -> usize {
        match self {
            Engine::Aes256Gcm => <Aes256Gcm as AeadCore>::NonceSize::USIZE,
            #[cfg(feature = "xchacha")]
            Engine::XChaCha20Poly1305 => {
                <chacha20poly1305::XChaCha20Poly1305 as AeadCore>::NonceSize::USIZE
            }
        }
    }

    /// Encrypt every field of `database` under a key derived from `password`
    /// and the database's existing header salt.
    ///
    /// The header is copied unchanged into the result.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty password, duplicate ids, or an image
    ///   quality outside `0.0..=1.0`
    /// - `UnsupportedAlgorithm` if the header names another algorithm
    pub fn encrypt(&self, database: &Database, password: &str) -> Result<EncryptedDatabase> {
        self.check_algorithm(database.header())?;
        database.validate()?;

        let span = tracing::debug_span!(
            "encrypt",
            id = %database.id(),
            algorithm = %self.algorithm()
        );
        let _guard = span.enter();

        let key = derive_key(password, database.header().salt().as_bytes())?;
        let encrypted = match self {
            Engine::Aes256Gcm => seal_with::<Aes256Gcm>(&key, database),
            #[cfg(feature = "xchacha")]
            Engine::XChaCha20Poly1305 => {
                seal_with::<chacha20poly1305::XChaCha20Poly1305>(&key, database)
            }
        };
        if let Err(err) = &encrypted {
            tracing::debug!(error = %err, "encryption failed");
        }
        encrypted
    }

    /// Decrypt every field of `encrypted` with a key derived from `password`
    /// and the stored header salt.
    ///
    /// # Errors
    ///
    /// - `WrongPasswordOrCorruptData` on the first field whose tag fails
    /// - `CorruptPlaintext` if a verified field does not decode
    /// - `UnsupportedAlgorithm` if the header names another algorithm
    pub fn decrypt(&self, encrypted: &EncryptedDatabase, password: &str) -> Result<Database> {
        self.check_algorithm(&encrypted.header)?;

        let span = tracing::debug_span!(
            "decrypt",
            id = %encrypted.id(),
            algorithm = %self.algorithm()
        );
        let _guard = span.enter();

        let key = derive_key(password, encrypted.header.salt().as_bytes())?;
        let database = match self {
            Engine::Aes256Gcm => open_with::<Aes256Gcm>(key, encrypted, password),
            #[cfg(feature = "xchacha")]
            Engine::XChaCha20Poly1305 => {
                open_with::<chacha20poly1305::XChaCha20Poly1305>(key, encrypted, password)
            }
        };
        if let Err(err) = &database {
            tracing::debug!(error = %err, "decryption failed");
        }
        database
    }

    fn check_algorithm(&self, header: &Header) -> Result<()> {
        if header.algorithm() != self.algorithm() {
            return Err(StrongboxError::UnsupportedAlgorithm(format!(
                "{} engine cannot process a {} store",
                self.algorithm(),
                header.algorithm()
            )));
        }
        Ok(())
    }
}

fn seal_with<C>(key: &DerivedKey, database: &Database) -> Result<EncryptedDatabase>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = AeadFieldCipher::<C>::new(key)?;
    let mut sealer = Sealer::new(&cipher, database.id());
    let encrypted = sealer.database(database)?;
    tracing::debug!(fields = sealer.fields, "sealed store");
    Ok(encrypted)
}

fn open_with<C>(key: DerivedKey, encrypted: &EncryptedDatabase, password: &str) -> Result<Database>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = AeadFieldCipher::<C>::new(&key)?;
    let mut opener = Opener::new(&cipher, encrypted.id());
    let database = opener.database(encrypted, key, password)?;
    tracing::debug!(fields = opener.fields, "opened store");
    Ok(database)
}

/// Encrypt with the engine named by the database header.
pub fn encrypt(database: &Database, password: &str) -> Result<EncryptedDatabase> {
    Engine::for_header(database.header())?.encrypt(database, password)
}

/// Decrypt with the engine named by the stored header.
pub fn decrypt(encrypted: &EncryptedDatabase, password: &str) -> Result<Database> {
    Engine::for_header(&encrypted.header)?.decrypt(encrypted, password)
}
