//! Persistence adapters for locked stores.
//!
//! This module provides the [`StoreBackend`] trait and its implementations:
//!
//! - [`FlatFileStore`]: one portable `.sbx` file per store
//! - [`SqliteStore`]: all stores in one SQLite file, one row per content item
//!
//! [`StoreDirectory`] puts both behind one root directory and routes each
//! store to the backend named in its header. [`DatabaseCache`] keeps loaded
//! stores around between calls.

mod cache;
mod flat_file;
pub mod portable;
mod sqlite;
mod traits;

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Result, StrongboxError};
use crate::header::StorageBackend;
use crate::model::EncryptedDatabase;

pub use cache::{DatabaseCache, DEFAULT_CAPACITY};
pub use flat_file::FlatFileStore;
pub use portable::{export_to_file, import_from_file};
pub use sqlite::SqliteStore;
pub use traits::StoreBackend;

/// File name of the SQLite database inside a store directory.
pub const SQLITE_FILE_NAME: &str = "strongbox.sqlite3";

/// Sub-directory of a store directory holding flat-file stores.
pub const FLAT_FILE_DIR: &str = "files";

/// Open the backend of the given kind rooted at `root`.
pub fn open_backend(kind: StorageBackend, root: &Path) -> Result<Box<dyn StoreBackend>> {
    std::fs::create_dir_all(root)?;
    Ok(match kind {
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&root.join(SQLITE_FILE_NAME))?),
        StorageBackend::FlatFile => Box::new(FlatFileStore::open(&root.join(FLAT_FILE_DIR))?),
    })
}

/// Both backends under one directory.
pub struct StoreDirectory {
    root: PathBuf,
    sqlite: SqliteStore,
    flat_file: FlatFileStore,
}

impl StoreDirectory {
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            StrongboxError::Storage(format!(
                "Failed to create store directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            sqlite: SqliteStore::open(&root.join(SQLITE_FILE_NAME))?,
            flat_file: FlatFileStore::open(&root.join(FLAT_FILE_DIR))?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self, kind: StorageBackend) -> &dyn StoreBackend {
        match kind {
            StorageBackend::Sqlite => &self.sqlite,
            StorageBackend::FlatFile => &self.flat_file,
        }
    }

    fn backends(&self) -> [&dyn StoreBackend; 2] {
        [&self.sqlite as &dyn StoreBackend, &self.flat_file]
    }

    pub fn exists(&self, id: &Uuid) -> Result<bool> {
        for backend in self.backends() {
            if backend.exists(id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Every store from both backends, SQLite first.
    pub fn load_all(&self) -> Result<Vec<EncryptedDatabase>> {
        let mut out = self.sqlite.load_all()?;
        out.extend(self.flat_file.load_all()?);
        Ok(out)
    }

    pub fn load(&self, id: &Uuid) -> Result<EncryptedDatabase> {
        for backend in self.backends() {
            if backend.exists(id)? {
                return backend.load(id);
            }
        }
        Err(StrongboxError::NotFound(format!("Store {}", id)))
    }

    /// Save into the backend named by the store header.
    pub fn save(&self, database: &EncryptedDatabase) -> Result<()> {
        self.backend(database.header.backend()).save(database)
    }

    /// Save over any existing copy of the same store.
    ///
    /// The new copy is written before anything is removed. A copy left in
    /// the other backend is deleted only once the save has succeeded.
    pub fn replace(&self, database: &EncryptedDatabase) -> Result<()> {
        let target = database.header.backend();
        self.save(database)?;
        for backend in self.backends() {
            if backend.kind() != target && backend.exists(&database.id())? {
                tracing::debug!(id = %database.id(), from = %backend.kind(), "removing stale copy");
                backend.delete(&database.id())?;
            }
        }
        Ok(())
    }

    pub fn delete(&self, id: &Uuid) -> Result<()> {
        for backend in self.backends() {
            if backend.exists(id)? {
                return backend.delete(id);
            }
        }
        Err(StrongboxError::NotFound(format!("Store {}", id)))
    }

    /// Fill a cache from both backends.
    pub fn refresh(&self, cache: &mut DatabaseCache) -> Result<usize> {
        cache.clear();
        let mut count = 0;
        for backend in self.backends() {
            for database in backend.load_all()? {
                cache.insert(database);
                count += 1;
            }
        }
        Ok(count)
    }
}
