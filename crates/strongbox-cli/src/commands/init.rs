//! `strongbox init`: create a store.

use strongbox_core::{Database, NewDatabase};

use crate::app::{prompt_new_passphrase, resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{write_config, DefaultsSection, StrongboxConfig};
use crate::constants::env_vars;
use crate::errors::CliError;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::invalid_input("Store name cannot be empty").into());
    }

    let stores = ctx.stores()?;
    if stores
        .load_all()?
        .iter()
        .any(|store| store.record.name().eq_ignore_ascii_case(name))
    {
        return Err(CliError::invalid_input(format!(
            "A store named \"{}\" already exists",
            name
        ))
        .into());
    }

    let defaults = match ctx.config()? {
        Some(config) => (config.defaults.algorithm, config.defaults.backend),
        None => {
            let defaults = DefaultsSection::default();
            (defaults.algorithm, defaults.backend)
        }
    };
    let algorithm = args.algorithm.unwrap_or(defaults.0);
    let backend = args.backend.unwrap_or(defaults.1);

    let password = prompt_new_passphrase(env_vars::PASSPHRASE, ctx.interactive())?;
    let mut new = NewDatabase::new(name, password.as_str())
        .with_algorithm(algorithm.into())
        .with_backend(backend.into())
        .with_biometrics(args.allow_biometrics);
    if let Some(description) = &args.description {
        new = new.with_description(description.as_str());
    }
    if let Some(icon) = &args.icon {
        new = new.with_icon_name(icon.as_str());
    }

    let database = Database::create(new)?;
    stores.save(&database.lock()?)?;
    tracing::info!(store = %database.id(), "created store");

    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        let mut config = StrongboxConfig::new(&ctx.store_dir()?);
        config.defaults.algorithm = algorithm;
        config.defaults.backend = backend;
        write_config(&config_path, &config)?;
        if !ctx.quiet() {
            println!("Wrote config {}", config_path.display());
        }
    }

    if !ctx.quiet() {
        println!("Created store {} ({})", database.record().name(), database.id());
    }
    Ok(())
}
