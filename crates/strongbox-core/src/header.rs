//! Store header: the unencrypted, self-describing record of a store.
//!
//! The header names the algorithm and storage backend and carries the key
//! derivation salt. It is never encrypted: a reader must be able to parse it
//! to pick the right engine before any decryption can start.
//!
//! ## Text form
//!
//! ```text
//! AES-256-GCM;SQLITE;q0uPG1x0cVZc2lXb7sB2n4XfE0yq8m1D3e9QwJ0aT5k
//! ```
//!
//! Exactly three `;`-separated fields. The salt is URL-safe base64 without
//! padding, an alphabet that never contains the delimiter.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::crypto::key::MIN_SALT_LENGTH;
use crate::error::{Result, StrongboxError};

/// Field delimiter of the header text form.
pub const DELIMITER: char = ';';

/// Length of freshly generated salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Encryption algorithms a header can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    Aes256Gcm,
    XChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    pub fn as_tag(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::Aes256Gcm => "AES-256-GCM",
            EncryptionAlgorithm::XChaCha20Poly1305 => "XCHACHA20-POLY1305",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "AES-256-GCM" => Ok(EncryptionAlgorithm::Aes256Gcm),
            "XCHACHA20-POLY1305" => Ok(EncryptionAlgorithm::XChaCha20Poly1305),
            other => Err(StrongboxError::MalformedHeader(format!(
                "Unknown encryption algorithm tag: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Where the persistence adapter keeps the store.
///
/// Irrelevant to the cryptography; recorded so the store can be reopened
/// through the same adapter it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageBackend {
    /// Embedded SQLite object store
    Sqlite,
    /// One portable file per store
    FlatFile,
}

impl StorageBackend {
    pub fn as_tag(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "SQLITE",
            StorageBackend::FlatFile => "FLATFILE",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "SQLITE" => Ok(StorageBackend::Sqlite),
            "FLATFILE" => Ok(StorageBackend::FlatFile),
            other => Err(StrongboxError::MalformedHeader(format!(
                "Unknown storage backend tag: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Random key derivation salt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Draw a fresh salt from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing salt bytes; rejects salts under 16 bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SALT_LENGTH {
            return Err(StrongboxError::InvalidInput(format!(
                "Salt must be at least {} bytes (got {})",
                MIN_SALT_LENGTH,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.encode())
    }
}

/// Unencrypted store metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    algorithm: EncryptionAlgorithm,
    backend: StorageBackend,
    salt: Salt,
}

impl Header {
    pub fn new(algorithm: EncryptionAlgorithm, backend: StorageBackend, salt: Salt) -> Self {
        Self {
            algorithm,
            backend,
            salt,
        }
    }

    /// Header for a brand new store, with a fresh random salt.
    pub fn generate(algorithm: EncryptionAlgorithm, backend: StorageBackend) -> Self {
        Self::new(algorithm, backend, Salt::generate())
    }

    /// Same algorithm and backend, new salt.
    pub fn with_fresh_salt(&self) -> Self {
        Self::generate(self.algorithm, self.backend)
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Parse the text form.
    ///
    /// # Errors
    ///
    /// `MalformedHeader` unless the text has exactly three fields, known
    /// algorithm and backend tags, and a canonical salt of at least 16 bytes.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(DELIMITER).collect();
        let [algorithm, backend, salt] = fields.as_slice() else {
            return Err(StrongboxError::MalformedHeader(format!(
                "Expected 3 fields, found {}",
                fields.len()
            )));
        };

        let algorithm = EncryptionAlgorithm::from_tag(algorithm)?;
        let backend = StorageBackend::from_tag(backend)?;
        let salt_bytes = URL_SAFE_NO_PAD
            .decode(salt.as_bytes())
            .map_err(|e| StrongboxError::MalformedHeader(format!("Invalid salt encoding: {}", e)))?;
        let salt = Salt::from_bytes(salt_bytes)
            .map_err(|e| StrongboxError::MalformedHeader(e.to_string()))?;

        Ok(Self::new(algorithm, backend, salt))
    }

    /// Text form; `Header::parse(&h.serialize()) == Ok(h)`.
    pub fn serialize(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.algorithm.as_tag(),
            DELIMITER,
            self.backend.as_tag(),
            DELIMITER,
            self.salt.encode()
        )
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Header {
    type Err = StrongboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_malformed(text: &str) {
        match Header::parse(text) {
            Err(StrongboxError::MalformedHeader(_)) => {}
            other => panic!("expected MalformedHeader for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_parse_serialize_round_trip() {
        for algorithm in [
            EncryptionAlgorithm::Aes256Gcm,
            EncryptionAlgorithm::XChaCha20Poly1305,
        ] {
            for backend in [StorageBackend::Sqlite, StorageBackend::FlatFile] {
                let header = Header::generate(algorithm, backend);
                assert_eq!(Header::parse(&header.serialize()).unwrap(), header);
            }
        }
    }

    #[test]
    fn test_known_text_form() {
        let salt = Salt::from_bytes(vec![0u8; 16]).unwrap();
        let header = Header::new(EncryptionAlgorithm::Aes256Gcm, StorageBackend::Sqlite, salt);
        assert_eq!(
            header.serialize(),
            "AES-256-GCM;SQLITE;AAAAAAAAAAAAAAAAAAAAAA"
        );
    }

    #[test]
    fn test_generated_salt_is_delimiter_free_and_random() {
        let a = Header::generate(EncryptionAlgorithm::Aes256Gcm, StorageBackend::FlatFile);
        let b = Header::generate(EncryptionAlgorithm::Aes256Gcm, StorageBackend::FlatFile);
        assert_eq!(a.salt().as_bytes().len(), SALT_LENGTH);
        assert_ne!(a.salt(), b.salt());
        assert_eq!(a.serialize().matches(DELIMITER).count(), 2);
    }

    #[test]
    fn test_fresh_salt_keeps_algorithm_and_backend() {
        let header = Header::generate(
            EncryptionAlgorithm::XChaCha20Poly1305,
            StorageBackend::FlatFile,
        );
        let rotated = header.with_fresh_salt();
        assert_eq!(rotated.algorithm(), header.algorithm());
        assert_eq!(rotated.backend(), header.backend());
        assert_ne!(rotated.salt(), header.salt());
    }

    #[test]
    fn test_wrong_field_count() {
        assert_malformed("");
        assert_malformed("AES-256-GCM;SQLITE");
        assert_malformed("AES-256-GCM;SQLITE;AAAAAAAAAAAAAAAAAAAAAA;extra");
    }

    #[test]
    fn test_unknown_tags() {
        assert_malformed("AES256;SQLITE;AAAAAAAAAAAAAAAAAAAAAA");
        assert_malformed("AES-256-GCM;CoreData;AAAAAAAAAAAAAAAAAAAAAA");
        assert_malformed("aes-256-gcm;SQLITE;AAAAAAAAAAAAAAAAAAAAAA");
    }

    #[test]
    fn test_bad_salt() {
        // Too short once decoded.
        assert_malformed("AES-256-GCM;SQLITE;c2FsdA");
        // Padding and standard-alphabet characters are not canonical.
        assert_malformed("AES-256-GCM;SQLITE;AAAAAAAAAAAAAAAAAAAAAA==");
        assert_malformed("AES-256-GCM;SQLITE;AAAAAAAAAAAAAAAAAAAA+/");
    }

    #[test]
    fn test_from_str() {
        let header: Header = "XCHACHA20-POLY1305;FLATFILE;AAAAAAAAAAAAAAAAAAAAAA"
            .parse()
            .unwrap();
        assert_eq!(header.algorithm(), EncryptionAlgorithm::XChaCha20Poly1305);
        assert_eq!(header.backend(), StorageBackend::FlatFile);
    }
}
