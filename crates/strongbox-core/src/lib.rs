//! # Strongbox Core
//!
//! Core library for Strongbox - a password-protected content store for
//! credentials, documents, and images.
//!
//! This crate provides the store model, the encryption engine, and the
//! persistence adapters, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **codec**: Field values to and from bytes
//! - **header**: The unencrypted `ALGORITHM;BACKEND;salt` record
//! - **crypto**: Key derivation and per-field authenticated encryption
//! - **model**: Cleartext and sealed entity trees
//! - **engine**: Whole-tree encryption and decryption
//! - **storage**: Flat-file and SQLite backends, portable files, caching
//!
//! ## Example
//!
//! ```no_run
//! use strongbox_core::{Database, Document, NewDatabase, Record};
//!
//! # fn main() -> strongbox_core::Result<()> {
//! let mut db = Database::create(NewDatabase::new("Personal", "correct-horse"))?;
//! db.push(Document::new(Record::new("Todo"), "note", b"secret".to_vec()).into());
//!
//! let locked = db.lock()?;
//! let unlocked = locked.unlock("correct-horse")?;
//! assert_eq!(unlocked, db);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod fs;
pub mod header;
pub mod model;
pub mod storage;

pub use codec::RasterFormat;
pub use engine::{decrypt, encrypt, Engine};
pub use error::{Result, StrongboxError};
pub use header::{EncryptionAlgorithm, Header, Salt, StorageBackend};
pub use model::{
    Content, Database, Document, EncryptedDatabase, Entry, Folder, Image, NewDatabase, Record,
    SealedContent, StoreState,
};
pub use storage::{DatabaseCache, StoreBackend, StoreDirectory};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
