//! Entity tree model.
//!
//! Every entity is defined twice: a cleartext type with native fields and a
//! sealed type where every field is an opaque [`SealedField`]. The two are
//! connected only by the engine's explicit conversion functions.
//!
//! [`SealedField`]: crate::crypto::SealedField

pub mod content;
pub mod database;
pub mod record;

pub use content::{
    Content, Document, Entry, Folder, Image, SealedContent, SealedDocument, SealedEntry,
    SealedFolder, SealedImage,
};
pub use database::{Database, EncryptedDatabase, NewDatabase, StoreState};
pub use record::{Record, SealedRecord};
