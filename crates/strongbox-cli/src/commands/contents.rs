//! Commands that unlock a store and read or change its contents.

use dialoguer::Password;
use uuid::Uuid;

use strongbox_core::{Content, Database, Document, Entry, Folder, Image, Record};

use crate::app::AppContext;
use crate::cli::{AddDocumentArgs, AddEntryArgs, AddFolderArgs, AddImageArgs, NewItemArgs, ShowArgs};
use crate::errors::CliError;
use crate::output::{database_json, print_database, short_id};

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let database = ctx.unlock(&args.store)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&database_json(&database, args.reveal))?
        );
    } else {
        print_database(&database, args.reveal);
    }
    Ok(())
}

pub fn handle_add_folder(ctx: &AppContext, args: &AddFolderArgs) -> anyhow::Result<()> {
    add_item(ctx, &args.item, |record| Ok(Folder::new(record).into()))
}

pub fn handle_add_entry(ctx: &AppContext, args: &AddEntryArgs) -> anyhow::Result<()> {
    add_item(ctx, &args.item, |record| {
        let mut entry = Entry::new(record);
        entry.username = args.username.clone().unwrap_or_default();
        entry.password = match &args.secret {
            Some(secret) => secret.clone(),
            None if ctx.interactive() => Password::new()
                .with_prompt("Entry password (leave empty for none)")
                .allow_empty_password(true)
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read entry password: {}", e))?,
            None => String::new(),
        };
        entry.url = args.url.clone().unwrap_or_default();
        entry.notes = args.notes.clone().unwrap_or_default();
        Ok(entry.into())
    })
}

pub fn handle_add_document(ctx: &AppContext, args: &AddDocumentArgs) -> anyhow::Result<()> {
    let content = std::fs::read(&args.file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.file.display(), e))?;
    let doc_type = match &args.doc_type {
        Some(doc_type) => doc_type.clone(),
        None => args
            .file
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    };
    add_item(ctx, &args.item, move |record| {
        Ok(Document::new(record, doc_type, content).into())
    })
}

pub fn handle_add_image(ctx: &AppContext, args: &AddImageArgs) -> anyhow::Result<()> {
    if !args.file.exists() {
        return Err(CliError::not_found(
            format!("Image {} not found.", args.file.display()),
            "Hint: Pass a PNG or JPEG file with --file.",
        )
        .into());
    }
    add_item(ctx, &args.item, |record| {
        Ok(Image::from_path(record, &args.file, args.quality)?.into())
    })
}

/// Unlock the store, build the item, place it, and save the store again.
fn add_item<F>(ctx: &AppContext, item: &NewItemArgs, build: F) -> anyhow::Result<()>
where
    F: FnOnce(Record) -> anyhow::Result<Content>,
{
    let name = item.name.trim();
    if name.is_empty() {
        return Err(CliError::invalid_input("Item name cannot be empty").into());
    }

    let mut database = ctx.unlock(&item.store)?;
    let parent = item
        .parent
        .as_deref()
        .map(|selector| find_folder(&database, selector))
        .transpose()?;

    let mut record = Record::new(name);
    if let Some(description) = &item.description {
        record = record.with_description(description.as_str());
    }
    if let Some(icon) = &item.icon {
        record = record.with_icon_name(icon.as_str());
    }
    let content = build(record)?;
    let kind = content.kind();
    let id = content.id();

    match parent {
        Some(folder_id) => database.push_into(folder_id, content)?,
        None => database.push(content),
    }
    ctx.stores()?.save(&database.lock()?)?;
    tracing::info!(store = %database.id(), item = %id, kind, "added item");

    if !ctx.quiet() {
        println!("Added {} {} ({})", kind, name, id);
    }
    Ok(())
}

/// Resolve a folder by exact id, then name, then id prefix.
fn find_folder(database: &Database, selector: &str) -> Result<Uuid, CliError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(CliError::invalid_input("Folder selector is empty"));
    }
    let mut folders: Vec<(Uuid, String)> = Vec::new();
    database.walk(&mut |node| {
        if let Content::Folder(folder) = node {
            folders.push((folder.record.id(), folder.record.name().to_string()));
        }
    });

    if let Some((id, _)) = folders
        .iter()
        .find(|(id, _)| id.to_string().eq_ignore_ascii_case(selector))
    {
        return Ok(*id);
    }
    let mut matches: Vec<Uuid> = folders
        .iter()
        .filter(|(_, name)| name.eq_ignore_ascii_case(selector))
        .map(|(id, _)| *id)
        .collect();
    if matches.is_empty() {
        let prefix = selector.to_ascii_lowercase();
        matches = folders
            .iter()
            .filter(|(id, _)| id.to_string().starts_with(&prefix))
            .map(|(id, _)| *id)
            .collect();
    }

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::not_found(
            format!("Folder \"{}\" not found.", selector),
            "Hint: Run `strongbox show <STORE>` to see folder ids.",
        )),
        many => Err(CliError::invalid_input(format!(
            "\"{}\" matches {} folders: {}",
            selector,
            many.len(),
            many.iter().map(short_id).collect::<Vec<_>>().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::NewDatabase;

    fn sample() -> (Database, Uuid, Uuid) {
        let mut db = Database::create(NewDatabase::new("Personal", "correct-horse")).unwrap();
        let mut private = Folder::new(Record::new("Private"));
        let archive = Folder::new(Record::new("Archive"));
        let archive_id = archive.record.id();
        private.push(archive.into());
        let private_id = private.record.id();
        db.push(private.into());
        (db, private_id, archive_id)
    }

    #[test]
    fn test_find_folder_by_id_prefix_and_name() {
        let (db, private_id, archive_id) = sample();
        assert_eq!(find_folder(&db, &private_id.to_string()).unwrap(), private_id);
        assert_eq!(find_folder(&db, "archive").unwrap(), archive_id);
        assert_eq!(
            find_folder(&db, &archive_id.to_string()[..8]).unwrap(),
            archive_id
        );
    }

    #[test]
    fn test_find_folder_missing() {
        let (db, _, _) = sample();
        assert!(matches!(
            find_folder(&db, "Nowhere"),
            Err(CliError::NotFound { .. })
        ));
    }
}
