//! Per-field authenticated encryption.
//!
//! Every field is sealed on its own with a fresh random nonce. The caller
//! supplies the associated data that pins the blob to its slot. Reusing a nonce under the store key would break
//! confidentiality, so nonces are always drawn from the OS CSPRNG and never
//! derived from field contents or positions.

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce, OsRng, Payload};
use zeroize::Zeroizing;

use super::key::DerivedKey;
use super::sealed::SealedField;
use crate::error::{Result, StrongboxError};

/// Seals and opens single fields under one store key.
pub trait FieldCipher {
    /// Nonce length prefixed to every sealed blob.
    fn nonce_len(&self) -> usize;

    /// Encrypt one field, binding `aad` as associated data.
    fn seal(&self, aad: &[u8], plaintext: &[u8]) -> Result<SealedField>;

    /// Decrypt one field, verifying its tag.
    ///
    /// Any verification failure is `WrongPasswordOrCorruptData`.
    fn open(&self, aad: &[u8], sealed: &SealedField) -> Result<Zeroizing<Vec<u8>>>;
}

/// [`FieldCipher`] over any AEAD from the RustCrypto family.
pub struct AeadFieldCipher<C> {
    cipher: C,
}

impl<C: KeyInit> AeadFieldCipher<C> {
    /// Build the cipher from the derived store key.
    pub fn new(key: &DerivedKey) -> Result<Self> {
        let cipher = C::new_from_slice(key.as_bytes())
            .map_err(|e| StrongboxError::Crypto(format!("Invalid key length: {}", e)))?;
        Ok(Self { cipher })
    }
}

impl<C: Aead + AeadCore> FieldCipher for AeadFieldCipher<C> {
    fn nonce_len(&self) -> usize {
        C::NonceSize::USIZE
    }

    fn seal(&self, aad: &[u8], plaintext: &[u8]) -> Result<SealedField> {
        let nonce = C::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| StrongboxError::Crypto("Failed to seal field".to_string()))?;

        let mut blob = Vec::with_capacity(nonce.len() + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(SealedField::from_bytes(blob))
    }

    fn open(&self, aad: &[u8], sealed: &SealedField) -> Result<Zeroizing<Vec<u8>>> {
        let nonce_len = C::NonceSize::USIZE;
        let bytes = sealed.as_bytes();
        if bytes.len() < nonce_len + C::TagSize::USIZE {
            return Err(StrongboxError::WrongPasswordOrCorruptData);
        }

        let (nonce, ciphertext) = bytes.split_at(nonce_len);
        self.cipher
            .decrypt(
                Nonce::<C>::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| StrongboxError::WrongPasswordOrCorruptData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::Aes256Gcm;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_seal_open_round_trip() {
        let cipher = AeadFieldCipher::<Aes256Gcm>::new(&key(42)).unwrap();
        let sealed = cipher.seal(b"name", b"Private").unwrap();
        assert_eq!(sealed.len(), 12 + 7 + 16);
        let opened = cipher.open(b"name", &sealed).unwrap();
        assert_eq!(opened.as_slice(), b"Private");
    }

    #[test]
    fn test_same_plaintext_different_blobs() {
        let cipher = AeadFieldCipher::<Aes256Gcm>::new(&key(42)).unwrap();
        let a = cipher.seal(b"name", b"same").unwrap();
        let b = cipher.seal(b"name", b"same").unwrap();
        assert_ne!(a, b);
        assert_ne!(a.as_bytes()[..12], b.as_bytes()[..12]);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = AeadFieldCipher::<Aes256Gcm>::new(&key(1))
            .unwrap()
            .seal(b"name", b"secret")
            .unwrap();
        let other = AeadFieldCipher::<Aes256Gcm>::new(&key(2)).unwrap();
        assert!(matches!(
            other.open(b"name", &sealed),
            Err(StrongboxError::WrongPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_associated_data_is_bound() {
        let cipher = AeadFieldCipher::<Aes256Gcm>::new(&key(7)).unwrap();
        let sealed = cipher.seal(b"name", b"secret").unwrap();
        assert!(cipher.open(b"description", &sealed).is_err());
    }

    #[test]
    fn test_truncated_blob_fails() {
        let cipher = AeadFieldCipher::<Aes256Gcm>::new(&key(7)).unwrap();
        let sealed = SealedField::from_bytes(vec![0u8; 20]);
        assert!(matches!(
            cipher.open(b"name", &sealed),
            Err(StrongboxError::WrongPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = AeadFieldCipher::<Aes256Gcm>::new(&key(7)).unwrap();
        let mut sealed = cipher.seal(b"name", b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed.as_bytes_mut()[last] ^= 0x01;
        assert!(cipher.open(b"name", &sealed).is_err());
    }

    #[cfg(feature = "xchacha")]
    #[test]
    fn test_xchacha_uses_extended_nonce() {
        use chacha20poly1305::XChaCha20Poly1305;

        let cipher = AeadFieldCipher::<XChaCha20Poly1305>::new(&key(9)).unwrap();
        assert_eq!(cipher.nonce_len(), 24);
        let sealed = cipher.seal(b"notes", b"").unwrap();
        assert_eq!(sealed.len(), 24 + 16);
        assert!(cipher.open(b"notes", &sealed).unwrap().is_empty());
    }
}
