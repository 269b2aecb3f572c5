//! Path resolution and store lookup.

use std::path::PathBuf;

use strongbox_core::EncryptedDatabase;

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_dir, StrongboxConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking STRONGBOX_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("STRONGBOX_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the store directory: `--dir`/`STRONGBOX_DIR`, then config, then XDG data dir.
pub fn resolve_store_dir(cli: &Cli, config: Option<&StrongboxConfig>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli.dir.clone() {
        return Ok(dir);
    }
    if let Some(config) = config {
        return Ok(PathBuf::from(&config.store.dir));
    }
    default_store_dir()
}

/// Find one store by id, id prefix, or name (case-insensitive).
///
/// An exact id wins over a name, and a name wins over an id prefix.
pub fn find_store<'a>(
    stores: &'a [EncryptedDatabase],
    selector: &str,
) -> Result<&'a EncryptedDatabase, CliError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(CliError::invalid_input("Store selector is empty"));
    }

    if let Some(found) = stores
        .iter()
        .find(|db| db.id().to_string().eq_ignore_ascii_case(selector))
    {
        return Ok(found);
    }

    let by_name: Vec<&EncryptedDatabase> = stores
        .iter()
        .filter(|db| db.record.name().eq_ignore_ascii_case(selector))
        .collect();
    let candidates = if by_name.is_empty() {
        let prefix = selector.to_ascii_lowercase();
        stores
            .iter()
            .filter(|db| db.id().to_string().starts_with(&prefix))
            .collect()
    } else {
        by_name
    };

    match candidates.as_slice() {
        [single] => Ok(single),
        [] => Err(CliError::not_found(
            format!("Store \"{}\" not found.", selector),
            "Hint: Run `strongbox list` to see available stores.",
        )),
        many => Err(CliError::invalid_input(format!(
            "\"{}\" matches {} stores; use the store id instead",
            selector,
            many.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::crypto::SealedField;
    use strongbox_core::{EncryptionAlgorithm, Header, Record, StorageBackend};

    fn store(name: &str) -> EncryptedDatabase {
        EncryptedDatabase {
            record: Record::new(name),
            header: Header::generate(EncryptionAlgorithm::Aes256Gcm, StorageBackend::Sqlite),
            key: SealedField::from_bytes(vec![0; 44]),
            allow_biometrics: false,
            contents: Vec::new(),
        }
    }

    #[test]
    fn test_find_by_name_id_and_prefix() {
        let stores = vec![store("Personal"), store("Work")];
        assert_eq!(find_store(&stores, "personal").unwrap().record.name(), "Personal");

        let work_id = stores[1].id().to_string();
        assert_eq!(find_store(&stores, &work_id).unwrap().record.name(), "Work");
        assert_eq!(
            find_store(&stores, &work_id[..8]).unwrap().record.name(),
            "Work"
        );
    }

    #[test]
    fn test_missing_and_ambiguous() {
        let stores = vec![store("Personal"), store("personal")];
        assert!(matches!(
            find_store(&stores, "nope"),
            Err(CliError::NotFound { .. })
        ));
        assert!(matches!(
            find_store(&stores, "Personal"),
            Err(CliError::InvalidInput(_))
        ));
    }
}
