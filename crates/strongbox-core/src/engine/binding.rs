//! Associated data for every seal.
//!
//! A content field is bound to the store id, the position of its item in the
//! tree and its label, so a blob only opens in the exact slot it was sealed
//! for. The key check is bound to the cleartext parts of the store (header,
//! root record, biometrics flag) and to a manifest of the tree shape. Editing
//! any of those, or dropping, adding or moving an item, fails the key check.
//!
//! Every part is length prefixed, so no two part lists encode the same bytes.

use chrono::SecondsFormat;
use uuid::Uuid;

use super::label;
use crate::header::Header;
use crate::model::{Content, Record, SealedContent};

const FIELD: &[u8] = b"strongbox.field.v1";
const KEY_CHECK: &[u8] = b"strongbox.key.v1";

fn encode(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|part| part.len() + 4).sum());
    for part in parts {
        out.extend_from_slice(&(part.len() as u32).to_be_bytes());
        out.extend_from_slice(part);
    }
    out
}

fn path_bytes(path: &[usize]) -> Vec<u8> {
    path.iter()
        .flat_map(|index| (*index as u64).to_be_bytes())
        .collect()
}

/// Associated data of a content field at `path` (child indices from the root).
pub(crate) fn field_aad(store_id: &Uuid, path: &[usize], label: &str) -> Vec<u8> {
    encode(&[
        FIELD,
        store_id.as_bytes().as_slice(),
        path_bytes(path).as_slice(),
        label.as_bytes(),
    ])
}

/// Associated data of the key check blob.
pub(crate) fn key_check_aad(
    header: &Header,
    record: &Record,
    allow_biometrics: bool,
    manifest: &[u8],
) -> Vec<u8> {
    let created = record.created().to_rfc3339_opts(SecondsFormat::Nanos, true);
    let last_edited = record.last_edited().to_rfc3339_opts(SecondsFormat::Nanos, true);
    encode(&[
        KEY_CHECK,
        label::KEY_CHECK.as_bytes(),
        header.serialize().as_bytes(),
        record.id().as_bytes().as_slice(),
        record.name().as_bytes(),
        record.description().as_bytes(),
        record.icon_name().as_bytes(),
        created.as_bytes(),
        last_edited.as_bytes(),
        [u8::from(allow_biometrics)].as_slice(),
        manifest,
    ])
}

/// Shape of a cleartext tree: per level the item count, then one kind tag per
/// item, with folders followed by their own level.
pub(crate) fn manifest(contents: &[Content]) -> Vec<u8> {
    let mut out = Vec::new();
    cleartext_shape(contents, &mut out);
    out
}

/// Shape of a sealed tree. Equal to [`manifest`] of the tree it came from.
pub(crate) fn sealed_manifest(contents: &[SealedContent]) -> Vec<u8> {
    let mut out = Vec::new();
    sealed_shape(contents, &mut out);
    out
}

fn cleartext_shape(contents: &[Content], out: &mut Vec<u8>) {
    out.extend_from_slice(&(contents.len() as u64).to_be_bytes());
    for item in contents {
        match item {
            Content::Folder(folder) => {
                out.push(b'f');
                cleartext_shape(&folder.contents, out);
            }
            Content::Entry(_) => out.push(b'e'),
            Content::Document(_) => out.push(b'd'),
            Content::Image(_) => out.push(b'i'),
        }
    }
}

fn sealed_shape(contents: &[SealedContent], out: &mut Vec<u8>) {
    out.extend_from_slice(&(contents.len() as u64).to_be_bytes());
    for item in contents {
        match item {
            SealedContent::Folder(folder) => {
                out.push(b'f');
                sealed_shape(&folder.contents, out);
            }
            SealedContent::Entry(_) => out.push(b'e'),
            SealedContent::Document(_) => out.push(b'd'),
            SealedContent::Image(_) => out.push(b'i'),
        }
    }
}
