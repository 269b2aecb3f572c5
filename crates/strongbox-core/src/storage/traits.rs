//! Persistence backend trait definition.
//!
//! A backend stores complete locked stores. It never sees cleartext and
//! never derives keys: it hands whole [`EncryptedDatabase`] values to the
//! engine and persists whatever the engine produced.

use uuid::Uuid;

use crate::error::Result;
use crate::header::StorageBackend;
use crate::model::EncryptedDatabase;

/// Persistence interface for locked stores.
///
/// All implementations must ensure:
/// - A save is all-or-nothing: readers see the old store or the new one
/// - Insert versus update is decided by whether the id is already present
/// - Loading never returns a partially read store
pub trait StoreBackend: Send + Sync {
    /// The header tag this backend persists.
    fn kind(&self) -> StorageBackend;

    /// Whether a store with this id is persisted.
    fn exists(&self, id: &Uuid) -> Result<bool>;

    /// Load every persisted store.
    fn load_all(&self) -> Result<Vec<EncryptedDatabase>>;

    /// Load one store.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no store has this id
    /// - `MalformedHeader` / `CorruptPlaintext` if the persisted form is damaged
    fn load(&self, id: &Uuid) -> Result<EncryptedDatabase>;

    /// Insert or replace a store.
    fn save(&self, database: &EncryptedDatabase) -> Result<()>;

    /// Remove a store.
    ///
    /// # Errors
    ///
    /// `NotFound` if no store has this id.
    fn delete(&self, id: &Uuid) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_backend(_backend: &dyn StoreBackend) {}
        fn _accepts_boxed(_backend: Box<dyn StoreBackend>) {}
    }
}
