//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure.
    pub const FAILURE: i32 = 1;

    /// Resource not found (config, store, folder).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password, too many attempts).
    pub const AUTH_FAILED: i32 = 5;

    /// Store is damaged or uses an unsupported algorithm.
    pub const DAMAGED: i32 = 6;
}

/// Environment variables read by the CLI.
pub mod env_vars {
    /// Store password for non-interactive use.
    pub const PASSPHRASE: &str = "STRONGBOX_PASSPHRASE";

    /// New store password for non-interactive `passwd`.
    pub const NEW_PASSPHRASE: &str = "STRONGBOX_NEW_PASSPHRASE";

    /// `tracing` filter directives.
    pub const LOG: &str = "STRONGBOX_LOG";
}

/// Password attempts allowed at an interactive prompt.
pub const MAX_PASSPHRASE_ATTEMPTS: u32 = 3;
