//! Strongbox CLI - password-protected stores for credentials, documents, and images
//!
//! This is the command-line interface for Strongbox. It provides a
//! user-friendly interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use strongbox_core::{StrongboxError, VERSION};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{contents, init, misc, stores};
use crate::constants::{env_vars, exit_codes};
use crate::errors::CliError;

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        exit_with_error(e);
    }
}

/// Log to stderr, filtered by STRONGBOX_LOG (warnings only by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(env_vars::LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Map an error to its exit code, preferring typed CLI and core errors.
fn exit_with_error(err: anyhow::Error) -> ! {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        cli_err.exit()
    }
    if let Some(core_err) = err.downcast_ref::<StrongboxError>() {
        if let Some(cli_err) = CliError::from_core(core_err) {
            cli_err.exit()
        }
    }
    eprintln!("Error: {:#}", err);
    std::process::exit(exit_codes::FAILURE)
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => {
            init::handle_init(ctx, args)?;
        }
        Some(Commands::List(args)) => {
            stores::handle_list(ctx, args)?;
        }
        Some(Commands::Header(args)) => {
            stores::handle_header(ctx, args)?;
        }
        Some(Commands::Show(args)) => {
            contents::handle_show(ctx, args)?;
        }
        Some(Commands::AddFolder(args)) => {
            contents::handle_add_folder(ctx, args)?;
        }
        Some(Commands::AddEntry(args)) => {
            contents::handle_add_entry(ctx, args)?;
        }
        Some(Commands::AddDocument(args)) => {
            contents::handle_add_document(ctx, args)?;
        }
        Some(Commands::AddImage(args)) => {
            contents::handle_add_image(ctx, args)?;
        }
        Some(Commands::Passwd(args)) => {
            stores::handle_passwd(ctx, args)?;
        }
        Some(Commands::Export(args)) => {
            stores::handle_export(ctx, args)?;
        }
        Some(Commands::Import(args)) => {
            stores::handle_import(ctx, args)?;
        }
        Some(Commands::Delete(args)) => {
            stores::handle_delete(ctx, args)?;
        }
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args)?;
        }
        None => {
            println!("Strongbox v{}", VERSION);
            println!("\nQuickstart:");
            println!("  strongbox init Personal");
            println!("  strongbox add-folder Personal Private");
            println!("  strongbox add-entry Personal Bank --parent Private --username jdoe");
            println!("  strongbox show Personal");
            println!("\nRun `strongbox --help` for full usage.");
        }
    }

    Ok(())
}
