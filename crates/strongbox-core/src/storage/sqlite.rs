//! SQLite backend.
//!
//! Root metadata lives in `databases`; every top-level content item is one
//! row of `toc_items`, ordered by `position`, holding the sealed item as
//! JSON. A save replaces the store's rows inside a single transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::traits::StoreBackend;
use crate::crypto::SealedField;
use crate::error::{Result, StrongboxError};
use crate::header::{Header, StorageBackend};
use crate::model::{EncryptedDatabase, Record, SealedContent};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS databases (
        id TEXT PRIMARY KEY,
        header TEXT NOT NULL,
        record_json TEXT NOT NULL,
        key_blob BLOB NOT NULL,
        allow_biometrics INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS toc_items (
        database_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        item_json TEXT NOT NULL,

        PRIMARY KEY (database_id, position),
        FOREIGN KEY (database_id) REFERENCES databases(id) ON DELETE CASCADE
    );
"#;

/// Raw row data from the databases table, before parsing into domain types.
#[derive(Debug)]
struct DatabaseRow {
    id: String,
    header: String,
    record_json: String,
    key_blob: Vec<u8>,
    allow_biometrics: bool,
}

impl DatabaseRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            header: row.get(1)?,
            record_json: row.get(2)?,
            key_blob: row.get(3)?,
            allow_biometrics: row.get(4)?,
        })
    }

    fn into_database(self, items: Vec<String>) -> Result<EncryptedDatabase> {
        let header = Header::parse(&self.header)?;
        let record: Record = serde_json::from_str(&self.record_json)
            .map_err(|e| corrupt_row("record", e.to_string()))?;
        if record.id().to_string() != self.id {
            return Err(corrupt_row(
                "id",
                format!("Row {} holds store {}", self.id, record.id()),
            ));
        }
        let contents = items
            .iter()
            .map(|json| {
                serde_json::from_str::<SealedContent>(json)
                    .map_err(|e| corrupt_row("contents", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EncryptedDatabase {
            record,
            header,
            key: SealedField::from_bytes(self.key_blob),
            allow_biometrics: self.allow_biometrics,
            contents,
        })
    }
}

fn corrupt_row(field: &str, reason: String) -> StrongboxError {
    StrongboxError::CorruptPlaintext {
        field: field.to_string(),
        reason,
    }
}

/// SQLite storage backend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a store database file.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StrongboxError::Storage("SQLite connection poisoned".to_string()))
    }

    fn load_items(conn: &Connection, id: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT item_json FROM toc_items WHERE database_id = ? ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([id], |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    fn load_with(conn: &Connection, id: &Uuid) -> Result<Option<EncryptedDatabase>> {
        let row = conn
            .query_row(
                "SELECT id, header, record_json, key_blob, allow_biometrics
                 FROM databases WHERE id = ?",
                [id.to_string()],
                DatabaseRow::from_row,
            )
            .optional()?;
        match row {
            Some(row) => {
                let items = Self::load_items(conn, &row.id)?;
                row.into_database(items).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl StoreBackend for SqliteStore {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    fn exists(&self, id: &Uuid) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM databases WHERE id = ?",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Stores that fail to load are skipped with a warning, so one damaged
    /// row does not hide the rest.
    fn load_all(&self) -> Result<Vec<EncryptedDatabase>> {
        let conn = self.lock_conn()?;
        let rows = {
            let mut stmt = conn.prepare(
                "SELECT id, header, record_json, key_blob, allow_biometrics
                 FROM databases ORDER BY id ASC",
            )?;
            let mapped = stmt.query_map([], DatabaseRow::from_row)?;
            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row?);
            }
            rows
        };

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            let items = Self::load_items(&conn, &id)?;
            match row.into_database(items) {
                Ok(database) => out.push(database),
                Err(err) => tracing::warn!(id = %id, error = %err, "skipping unreadable store"),
            }
        }
        Ok(out)
    }

    fn load(&self, id: &Uuid) -> Result<EncryptedDatabase> {
        let conn = self.lock_conn()?;
        Self::load_with(&conn, id)?
            .ok_or_else(|| StrongboxError::NotFound(format!("Store {}", id)))
    }

    fn save(&self, database: &EncryptedDatabase) -> Result<()> {
        let id = database.id().to_string();
        let header = database.header.serialize();
        let record_json = serde_json::to_string(&database.record)?;
        let items = database
            .contents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let present: Option<i64> = tx
            .query_row("SELECT 1 FROM databases WHERE id = ?", [&id], |row| {
                row.get(0)
            })
            .optional()?;
        if present.is_some() {
            tx.execute(
                "UPDATE databases
                 SET header = ?, record_json = ?, key_blob = ?, allow_biometrics = ?
                 WHERE id = ?",
                params![
                    header,
                    record_json,
                    database.key.as_bytes(),
                    database.allow_biometrics,
                    id
                ],
            )?;
            tx.execute("DELETE FROM toc_items WHERE database_id = ?", [&id])?;
        } else {
            tx.execute(
                "INSERT INTO databases (id, header, record_json, key_blob, allow_biometrics)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    id,
                    header,
                    record_json,
                    database.key.as_bytes(),
                    database.allow_biometrics
                ],
            )?;
        }

        for (position, item_json) in items.iter().enumerate() {
            tx.execute(
                "INSERT INTO toc_items (database_id, position, item_json) VALUES (?, ?, ?)",
                params![id, position as i64, item_json],
            )?;
        }

        tx.commit()?;
        tracing::debug!(
            id = %id,
            updated = present.is_some(),
            items = items.len(),
            "saved sqlite store"
        );
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let id = id.to_string();
        tx.execute("DELETE FROM toc_items WHERE database_id = ?", [&id])?;
        let removed = tx.execute("DELETE FROM databases WHERE id = ?", [&id])?;
        if removed == 0 {
            return Err(StrongboxError::NotFound(format!("Store {}", id)));
        }
        tx.commit()?;
        tracing::debug!(id = %id, "deleted sqlite store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::EncryptionAlgorithm;
    use crate::model::{SealedEntry, SealedRecord};

    fn blob(tag: u8) -> SealedField {
        SealedField::from_bytes(vec![tag; 28])
    }

    fn entry(tag: u8) -> SealedContent {
        SealedContent::Entry(SealedEntry {
            record: SealedRecord {
                name: blob(tag),
                description: blob(tag),
                icon_name: blob(tag),
                created: blob(tag),
                last_edited: blob(tag),
                id: blob(tag),
            },
            username: blob(tag),
            password: blob(tag),
            url: blob(tag),
            notes: blob(tag),
        })
    }

    fn sample(items: Vec<SealedContent>) -> EncryptedDatabase {
        EncryptedDatabase {
            record: Record::new("Personal"),
            header: Header::generate(EncryptionAlgorithm::Aes256Gcm, StorageBackend::Sqlite),
            key: blob(0xee),
            allow_biometrics: false,
            contents: items,
        }
    }

    #[test]
    fn test_insert_then_load_preserves_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let database = sample(vec![entry(1), entry(2), entry(3)]);
        store.save(&database).unwrap();
        assert_eq!(store.load(&database.id()).unwrap(), database);
    }

    #[test]
    fn test_update_replaces_items() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut database = sample(vec![entry(1), entry(2), entry(3)]);
        store.save(&database).unwrap();

        database.contents = vec![entry(9)];
        database.allow_biometrics = true;
        store.save(&database).unwrap();

        let loaded = store.load(&database.id()).unwrap();
        assert_eq!(loaded, database);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let database = sample(vec![entry(1)]);
        store.save(&database).unwrap();
        assert!(store.exists(&database.id()).unwrap());

        store.delete(&database.id()).unwrap();
        assert!(!store.exists(&database.id()).unwrap());
        assert!(matches!(
            store.load(&database.id()),
            Err(StrongboxError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&database.id()),
            Err(StrongboxError::NotFound(_))
        ));
    }

    #[test]
    fn test_damaged_header_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let database = sample(Vec::new());
        store.save(&database).unwrap();
        {
            let conn = store.lock_conn().unwrap();
            conn.execute(
                "UPDATE databases SET header = 'garbage' WHERE id = ?",
                [database.id().to_string()],
            )
            .unwrap();
        }
        assert!(matches!(
            store.load(&database.id()),
            Err(StrongboxError::MalformedHeader(_))
        ));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strongbox.sqlite3");
        let database = sample(vec![entry(4)]);
        SqliteStore::open(&path).unwrap().save(&database).unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load(&database.id()).unwrap(), database);
    }
}
