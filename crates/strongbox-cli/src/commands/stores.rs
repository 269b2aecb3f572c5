//! Whole-store commands: list, header, passwd, export, import, delete.

use std::io::IsTerminal;

use dialoguer::Confirm;

use strongbox_core::storage::{export_to_file, import_from_file};

use crate::app::{prompt_new_passphrase, AppContext};
use crate::cli::{DeleteArgs, ExportArgs, ImportArgs, ListArgs, StoreArg};
use crate::constants::env_vars;
use crate::errors::CliError;
use crate::output::{store_summary_json, store_table};

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let all = ctx.stores()?.load_all()?;
    let mut stores: Vec<_> = all.iter().collect();
    stores.sort_by(|a, b| {
        a.record
            .name()
            .to_lowercase()
            .cmp(&b.record.name().to_lowercase())
            .then_with(|| a.id().cmp(&b.id()))
    });

    if args.json {
        let values: Vec<serde_json::Value> =
            stores.iter().map(|store| store_summary_json(store)).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if stores.is_empty() {
        if !ctx.quiet() {
            println!("No stores yet.\n\nCreate one:\n  strongbox init <NAME>");
        }
        return Ok(());
    }
    println!("{}", store_table(&stores, std::io::stdout().is_terminal()));
    Ok(())
}

pub fn handle_header(ctx: &AppContext, args: &StoreArg) -> anyhow::Result<()> {
    let store = ctx.find_store(&args.store)?;
    println!("{}", store.header.serialize());
    Ok(())
}

pub fn handle_passwd(ctx: &AppContext, args: &StoreArg) -> anyhow::Result<()> {
    let mut database = ctx.unlock(&args.store)?;
    let password = prompt_new_passphrase(env_vars::NEW_PASSPHRASE, ctx.interactive())?;
    database.change_password(password.as_str())?;
    ctx.stores()?.save(&database.lock()?)?;
    tracing::info!(store = %database.id(), "changed store password");

    if !ctx.quiet() {
        println!("Changed password for {}", database.record().name());
    }
    Ok(())
}

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let store = ctx.find_store(&args.store)?;
    export_to_file(&store, &args.destination)?;

    if !ctx.quiet() {
        println!(
            "Exported {} to {}",
            store.record.name(),
            args.destination.display()
        );
    }
    Ok(())
}

pub fn handle_import(ctx: &AppContext, args: &ImportArgs) -> anyhow::Result<()> {
    let store = import_from_file(&args.file)?;
    let stores = ctx.stores()?;
    if stores.exists(&store.id())? {
        if !args.force {
            return Err(CliError::invalid_input(format!(
                "Store {} already exists. Use --force to replace it.",
                store.id()
            ))
            .into());
        }
        stores.replace(&store)?;
    } else {
        stores.save(&store)?;
    }

    if !ctx.quiet() {
        println!("Imported {} ({})", store.record.name(), store.id());
    }
    Ok(())
}

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let store = ctx.find_store(&args.store)?;

    if !args.yes {
        if !ctx.interactive() {
            return Err(CliError::invalid_input(
                "Refusing to delete without confirmation. Pass --yes.",
            )
            .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete store \"{}\"? This cannot be undone",
                store.record.name()
            ))
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            if !ctx.quiet() {
                println!("Cancelled.");
            }
            return Ok(());
        }
    }

    ctx.stores()?.delete(&store.id())?;
    if !ctx.quiet() {
        println!("Deleted store {}", store.record.name());
    }
    Ok(())
}
