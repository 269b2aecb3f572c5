//! Text and table output formatting for stores and content trees.

use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::{ContentArrangement, Table};

use strongbox_core::{Content, Database, EncryptedDatabase, Record};

use super::{short_id, MASK};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render locked stores as a table, bordered when `pretty`.
pub fn store_table(stores: &[&EncryptedDatabase], pretty: bool) -> String {
    let mut table = Table::new();
    table.load_preset(if pretty { UTF8_FULL } else { NOTHING });
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "NAME", "ITEMS", "ALGORITHM", "BACKEND", "EDITED"]);
    for store in stores {
        table.add_row(vec![
            short_id(&store.id()),
            store.record.name().to_string(),
            store.contents.len().to_string(),
            store.header.algorithm().as_tag().to_string(),
            store.header.backend().as_tag().to_string(),
            store.record.last_edited().format(TIME_FORMAT).to_string(),
        ]);
    }
    table.to_string()
}

fn label(record: &Record) -> String {
    if record.description().is_empty() {
        format!("{} ({})", record.name(), short_id(&record.id()))
    } else {
        format!(
            "{} ({}) - {}",
            record.name(),
            short_id(&record.id()),
            record.description()
        )
    }
}

fn content_lines(content: &Content, depth: usize, reveal: bool, out: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let head = format!("{}[{}] {}", indent, content.kind(), label(content.record()));
    out.push(head);
    let detail = format!("{}    ", indent);
    match content {
        Content::Folder(folder) => {
            for child in &folder.contents {
                content_lines(child, depth + 1, reveal, out);
            }
        }
        Content::Entry(entry) => {
            if !entry.username.is_empty() {
                out.push(format!("{}username: {}", detail, entry.username));
            }
            if !entry.password.is_empty() {
                let password = if reveal { entry.password.as_str() } else { MASK };
                out.push(format!("{}password: {}", detail, password));
            }
            if !entry.url.is_empty() {
                out.push(format!("{}url: {}", detail, entry.url));
            }
            if !entry.notes.is_empty() {
                out.push(format!("{}notes: {}", detail, entry.notes));
            }
        }
        Content::Document(document) => {
            let doc_type = if document.doc_type.is_empty() {
                "-"
            } else {
                document.doc_type.as_str()
            };
            out.push(format!(
                "{}type: {}, {} bytes",
                detail,
                doc_type,
                document.content.len()
            ));
        }
        Content::Image(image) => {
            out.push(format!(
                "{}{}, quality {:.2}, {} bytes",
                detail,
                image.format.as_tag(),
                image.quality,
                image.data.len()
            ));
        }
    }
}

/// Render an unlocked store as an indented tree.
pub fn database_lines(database: &Database, reveal: bool) -> Vec<String> {
    let mut out = vec![label(database.record())];
    for content in database.contents() {
        content_lines(content, 1, reveal, &mut out);
    }
    out
}

pub fn print_database(database: &Database, reveal: bool) {
    for line in database_lines(database, reveal) {
        println!("{}", line);
    }
}
