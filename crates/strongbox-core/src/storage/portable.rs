//! Portable single-file form of a locked store.
//!
//! ```text
//! AES-256-GCM;FLATFILE;<salt>
//! {"record":{...},"allow_biometrics":false,"key":"<base64>","contents":[...]}
//! ```
//!
//! The first line is the header record exactly as [`Header::serialize`]
//! writes it. The rest is JSON with every sealed field as standard base64,
//! so each blob round-trips byte for byte.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::SealedField;
use crate::error::{Result, StrongboxError};
use crate::header::Header;
use crate::model::{EncryptedDatabase, Record, SealedContent};

/// File extension of portable store files.
pub const EXTENSION: &str = "sbx";

#[derive(Serialize)]
struct BodyRef<'a> {
    record: &'a Record,
    allow_biometrics: bool,
    key: &'a SealedField,
    contents: &'a [SealedContent],
}

#[derive(Deserialize)]
struct Body {
    record: Record,
    allow_biometrics: bool,
    key: SealedField,
    contents: Vec<SealedContent>,
}

/// Serialize a locked store to its portable form.
pub fn to_bytes(database: &EncryptedDatabase) -> Result<Vec<u8>> {
    let body = BodyRef {
        record: &database.record,
        allow_biometrics: database.allow_biometrics,
        key: &database.key,
        contents: &database.contents,
    };
    let mut out = database.header.serialize().into_bytes();
    out.push(b'\n');
    serde_json::to_writer(&mut out, &body)?;
    out.push(b'\n');
    Ok(out)
}

/// Parse the portable form.
///
/// # Errors
///
/// - `MalformedHeader` if the first line is missing or does not parse
/// - `CorruptPlaintext` if the body is not a complete store
pub fn from_bytes(bytes: &[u8]) -> Result<EncryptedDatabase> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| StrongboxError::MalformedHeader("Missing header line".to_string()))?;
    let line = std::str::from_utf8(&bytes[..newline])
        .map_err(|_| StrongboxError::MalformedHeader("Header is not UTF-8".to_string()))?;
    let header = Header::parse(line.trim_end_matches('\r'))?;

    let body: Body =
        serde_json::from_slice(&bytes[newline + 1..]).map_err(|e| StrongboxError::CorruptPlaintext {
            field: "body".to_string(),
            reason: e.to_string(),
        })?;

    Ok(EncryptedDatabase {
        record: body.record,
        header,
        key: body.key,
        allow_biometrics: body.allow_biometrics,
        contents: body.contents,
    })
}

/// Write a locked store to `path` in portable form, atomically.
pub fn export_to_file(database: &EncryptedDatabase, path: &Path) -> Result<()> {
    let bytes = to_bytes(database)?;
    crate::fs::write_atomic(path, &bytes)?;
    tracing::debug!(id = %database.id(), path = %path.display(), "exported store");
    Ok(())
}

/// Read a portable store file.
pub fn import_from_file(path: &Path) -> Result<EncryptedDatabase> {
    if !path.exists() {
        return Err(StrongboxError::NotFound(format!(
            "Store file {}",
            path.display()
        )));
    }
    let bytes = fs::read(path)?;
    let database = from_bytes(&bytes)?;
    tracing::debug!(id = %database.id(), path = %path.display(), "imported store");
    Ok(database)
}
