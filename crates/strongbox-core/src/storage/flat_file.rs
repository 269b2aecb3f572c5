//! One portable file per store in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::portable::{self, EXTENSION};
use super::traits::StoreBackend;
use crate::error::{Result, StrongboxError};
use crate::header::StorageBackend;
use crate::model::EncryptedDatabase;

/// Flat-file backend: `<dir>/<id>.sbx`, written atomically.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    dir: PathBuf,
}

impl FlatFileStore {
    /// Open (creating if needed) a store directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            StrongboxError::Storage(format!(
                "Failed to create store directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }

    fn read(&self, id: &Uuid, path: &Path) -> Result<EncryptedDatabase> {
        let bytes = fs::read(path)?;
        let database = portable::from_bytes(&bytes)?;
        if database.id() != *id {
            return Err(StrongboxError::CorruptPlaintext {
                field: "id".to_string(),
                reason: format!("File {} holds store {}", path.display(), database.id()),
            });
        }
        Ok(database)
    }
}

impl StoreBackend for FlatFileStore {
    fn kind(&self) -> StorageBackend {
        StorageBackend::FlatFile
    }

    fn exists(&self, id: &Uuid) -> Result<bool> {
        Ok(self.path_for(id).is_file())
    }

    /// Stores that fail to load are skipped with a warning, so one damaged
    /// file does not hide the rest.
    fn load_all(&self) -> Result<Vec<EncryptedDatabase>> {
        let mut ids = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let stem = path.file_stem().and_then(|stem| stem.to_str());
            if let Some(id) = stem.and_then(|stem| Uuid::parse_str(stem).ok()) {
                ids.push((id, path));
            }
        }
        ids.sort();

        let mut out = Vec::with_capacity(ids.len());
        for (id, path) in ids {
            match self.read(&id, &path) {
                Ok(database) => out.push(database),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable store")
                }
            }
        }
        Ok(out)
    }

    fn load(&self, id: &Uuid) -> Result<EncryptedDatabase> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StrongboxError::NotFound(format!("Store {}", id)));
        }
        self.read(id, &path)
    }

    fn save(&self, database: &EncryptedDatabase) -> Result<()> {
        let path = self.path_for(&database.id());
        let replacing = path.is_file();
        crate::fs::write_atomic(&path, &portable::to_bytes(database)?)?;
        tracing::debug!(id = %database.id(), replacing, "saved flat-file store");
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StrongboxError::NotFound(format!("Store {}", id)));
        }
        fs::remove_file(&path)?;
        tracing::debug!(id = %id, "deleted flat-file store");
        Ok(())
    }
}
