//! JSON output formatting for stores and content trees.

use strongbox_core::{Content, Database, EncryptedDatabase, Record};

use super::MASK;

fn record_json(record: &Record) -> serde_json::Map<String, serde_json::Value> {
    let value = serde_json::json!({
        "id": record.id(),
        "name": record.name(),
        "description": record.description(),
        "icon_name": record.icon_name(),
        "created": record.created().to_rfc3339(),
        "last_edited": record.last_edited().to_rfc3339(),
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// What `list --json` prints for one locked store.
pub fn store_summary_json(store: &EncryptedDatabase) -> serde_json::Value {
    let mut map = record_json(&store.record);
    map.insert(
        "algorithm".into(),
        store.header.algorithm().as_tag().into(),
    );
    map.insert("backend".into(), store.header.backend().as_tag().into());
    map.insert("allow_biometrics".into(), store.allow_biometrics.into());
    map.insert("items".into(), store.contents.len().into());
    serde_json::Value::Object(map)
}

/// Convert a content node to JSON, recursing into folders.
pub fn content_json(content: &Content, reveal: bool) -> serde_json::Value {
    let mut map = record_json(content.record());
    map.insert("kind".into(), content.kind().into());
    match content {
        Content::Folder(folder) => {
            let children: Vec<serde_json::Value> = folder
                .contents
                .iter()
                .map(|child| content_json(child, reveal))
                .collect();
            map.insert("contents".into(), children.into());
        }
        Content::Entry(entry) => {
            map.insert("username".into(), entry.username.clone().into());
            let password = if reveal {
                entry.password.clone()
            } else {
                MASK.to_string()
            };
            map.insert("password".into(), password.into());
            map.insert("url".into(), entry.url.clone().into());
            map.insert("notes".into(), entry.notes.clone().into());
        }
        Content::Document(document) => {
            map.insert("type".into(), document.doc_type.clone().into());
            map.insert("size".into(), document.content.len().into());
            if let Ok(text) = std::str::from_utf8(&document.content) {
                map.insert("text".into(), text.into());
            }
        }
        Content::Image(image) => {
            map.insert("format".into(), image.format.as_tag().into());
            map.insert("quality".into(), image.quality.into());
            map.insert("size".into(), image.data.len().into());
        }
    }
    serde_json::Value::Object(map)
}

/// Convert an unlocked store to JSON for `show --json`.
pub fn database_json(database: &Database, reveal: bool) -> serde_json::Value {
    let mut map = record_json(database.record());
    map.insert("header".into(), database.header().serialize().into());
    map.insert("allow_biometrics".into(), database.allow_biometrics().into());
    let contents: Vec<serde_json::Value> = database
        .contents()
        .iter()
        .map(|content| content_json(content, reveal))
        .collect();
    map.insert("contents".into(), contents.into());
    serde_json::Value::Object(map)
}
