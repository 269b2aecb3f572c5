//! In-memory cache of locked stores.
//!
//! The cache is an ordinary value owned by whoever drives a backend. It only
//! ever holds [`EncryptedDatabase`] values, so nothing secret is cached.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use super::traits::StoreBackend;
use crate::error::Result;
use crate::model::EncryptedDatabase;

/// Default number of stores kept.
pub const DEFAULT_CAPACITY: usize = 32;

/// Bounded cache with least-recently-used eviction.
#[derive(Debug)]
pub struct DatabaseCache {
    capacity: usize,
    entries: HashMap<Uuid, EncryptedDatabase>,
    // Front is least recently used.
    order: VecDeque<Uuid>,
}

impl Default for DatabaseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DatabaseCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.entries.contains_key(id)
    }

    fn mark_used(&mut self, id: &Uuid) {
        if let Some(pos) = self.order.iter().position(|cached| cached == id) {
            self.order.remove(pos);
        }
        self.order.push_back(*id);
    }

    /// Look up a store, marking it most recently used.
    pub fn get(&mut self, id: &Uuid) -> Option<&EncryptedDatabase> {
        if !self.entries.contains_key(id) {
            return None;
        }
        self.mark_used(id);
        self.entries.get(id)
    }

    /// Insert or replace a store, evicting the least recently used one when full.
    pub fn insert(&mut self, database: EncryptedDatabase) {
        let id = database.id();
        self.entries.insert(id, database);
        self.mark_used(&id);
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    tracing::trace!(id = %oldest, "evicted cached store");
                }
                None => break,
            }
        }
    }

    /// Drop one store from the cache.
    pub fn evict(&mut self, id: &Uuid) -> Option<EncryptedDatabase> {
        if let Some(pos) = self.order.iter().position(|cached| cached == id) {
            self.order.remove(pos);
        }
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Replace the cache contents with everything the backend holds.
    ///
    /// Returns the number of stores loaded; with more stores than capacity,
    /// only the last ones loaded stay cached.
    pub fn refresh(&mut self, backend: &dyn StoreBackend) -> Result<usize> {
        let all = backend.load_all()?;
        let count = all.len();
        self.clear();
        for database in all {
            self.insert(database);
        }
        tracing::debug!(count, backend = %backend.kind(), "refreshed store cache");
        Ok(count)
    }

    /// Cached store, or load it from the backend and cache it.
    pub fn get_or_load(
        &mut self,
        backend: &dyn StoreBackend,
        id: &Uuid,
    ) -> Result<&EncryptedDatabase> {
        if !self.contains(id) {
            let database = backend.load(id)?;
            self.insert(database);
        }
        self.mark_used(id);
        self.entries
            .get(id)
            .ok_or_else(|| crate::error::StrongboxError::NotFound(format!("Store {}", id)))
    }

    /// Stores currently cached, least recently used first.
    pub fn iter(&self) -> impl Iterator<Item = &EncryptedDatabase> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SealedField;
    use crate::header::{EncryptionAlgorithm, Header, StorageBackend};
    use crate::model::Record;
    use crate::storage::SqliteStore;

    fn sample(name: &str) -> EncryptedDatabase {
        EncryptedDatabase {
            record: Record::new(name),
            header: Header::generate(EncryptionAlgorithm::Aes256Gcm, StorageBackend::Sqlite),
            key: SealedField::from_bytes(vec![1; 44]),
            allow_biometrics: false,
            contents: Vec::new(),
        }
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = DatabaseCache::new(2);
        let a = sample("A");
        let b = sample("B");
        let c = sample("C");
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());

        cache.insert(a);
        cache.insert(b);
        assert!(cache.get(&a_id).is_some());
        cache.insert(c);

        assert!(cache.contains(&a_id));
        assert!(!cache.contains(&b_id));
        assert!(cache.contains(&c_id));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut cache = DatabaseCache::new(4);
        let mut database = sample("A");
        cache.insert(database.clone());
        database.allow_biometrics = true;
        cache.insert(database.clone());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&database.id()).unwrap().allow_biometrics);
    }

    #[test]
    fn test_evict_and_zero_capacity() {
        let mut cache = DatabaseCache::new(0);
        assert_eq!(cache.capacity(), 1);
        let database = sample("A");
        let id = database.id();
        cache.insert(database);
        assert!(cache.evict(&id).is_some());
        assert!(cache.is_empty());
        assert!(cache.evict(&id).is_none());
    }

    #[test]
    fn test_refresh_and_get_or_load() {
        let backend = SqliteStore::open_in_memory().unwrap();
        let first = sample("First");
        let second = sample("Second");
        backend.save(&first).unwrap();
        backend.save(&second).unwrap();

        let mut cache = DatabaseCache::default();
        assert_eq!(cache.refresh(&backend).unwrap(), 2);
        assert_eq!(cache.iter().count(), 2);

        cache.evict(&first.id());
        let loaded = cache.get_or_load(&backend, &first.id()).unwrap();
        assert_eq!(loaded, &first);
        assert!(cache
            .get_or_load(&backend, &Uuid::new_v4())
            .is_err());
    }
}
