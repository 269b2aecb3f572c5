//! Password prompts and store unlocking with retry logic.

use dialoguer::Password;
use zeroize::Zeroizing;

use strongbox_core::{Database, EncryptedDatabase, StrongboxError};

use crate::constants::{env_vars, MAX_PASSPHRASE_ATTEMPTS};
use crate::errors::CliError;

fn env_passphrase(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Zeroizing::new)
}

/// Prompt for a store password, or read it from STRONGBOX_PASSPHRASE.
pub fn prompt_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_passphrase(env_vars::PASSPHRASE) {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set {}.",
            env_vars::PASSPHRASE
        ));
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a new password with confirmation, or read it from `env_var`.
pub fn prompt_new_passphrase(
    env_var: &str,
    interactive: bool,
) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_passphrase(env_var) {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set {}.",
            env_var
        ));
    }
    Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Unlock a store, prompting again after a wrong password.
///
/// A password from the environment gets a single attempt.
pub fn unlock_with_retry(
    store: &EncryptedDatabase,
    interactive: bool,
) -> anyhow::Result<Database> {
    let from_env = env_passphrase(env_vars::PASSPHRASE).is_some();
    let max_attempts = if interactive && !from_env {
        MAX_PASSPHRASE_ATTEMPTS
    } else {
        1
    };
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let password = prompt_passphrase(interactive)?;
        match store.unlock(&password) {
            Ok(database) => {
                tracing::debug!(store = %store.id(), attempts, "store unlocked");
                return Ok(database);
            }
            Err(StrongboxError::WrongPasswordOrCorruptData) => {
                let remaining = max_attempts.saturating_sub(attempts);
                if remaining == 0 {
                    let message = if max_attempts == 1 {
                        "Could not unlock the store."
                    } else {
                        "Too many failed password attempts."
                    };
                    return Err(CliError::auth_failed_with_hint(
                        message,
                        "Hint: A forgotten password cannot be recovered. A damaged store gives the same error.",
                    )
                    .into());
                }
                eprintln!(
                    "Incorrect password. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
}
