use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use strongbox_core::{EncryptionAlgorithm, StorageBackend, VERSION};

/// Strongbox - password-protected stores for credentials, documents, and images
#[derive(Parser)]
#[command(name = "strongbox")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the stores
    #[arg(short, long, global = true, env = "STRONGBOX_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new store
    Init(InitArgs),

    /// List stores (no password needed)
    List(ListArgs),

    /// Print a store's unencrypted header
    Header(StoreArg),

    /// Unlock a store and print its contents
    Show(ShowArgs),

    /// Add a folder
    AddFolder(AddFolderArgs),

    /// Add a credential entry
    AddEntry(AddEntryArgs),

    /// Add a document from a file
    AddDocument(AddDocumentArgs),

    /// Add a PNG or JPEG image from a file
    AddImage(AddImageArgs),

    /// Change a store's password (rotates its salt)
    Passwd(StoreArg),

    /// Write a store to a portable file
    Export(ExportArgs),

    /// Read a store from a portable file
    Import(ImportArgs),

    /// Delete a store
    Delete(DeleteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Encryption algorithm as accepted on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum AlgorithmChoice {
    #[value(name = "aes-256-gcm")]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[value(name = "xchacha20-poly1305")]
    #[serde(rename = "xchacha20-poly1305")]
    Xchacha20Poly1305,
}

impl From<AlgorithmChoice> for EncryptionAlgorithm {
    fn from(choice: AlgorithmChoice) -> Self {
        match choice {
            AlgorithmChoice::Aes256Gcm => EncryptionAlgorithm::Aes256Gcm,
            AlgorithmChoice::Xchacha20Poly1305 => EncryptionAlgorithm::XChaCha20Poly1305,
        }
    }
}

/// Storage backend as accepted on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendChoice {
    Sqlite,
    FlatFile,
}

impl From<BackendChoice> for StorageBackend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Sqlite => StorageBackend::Sqlite,
            BackendChoice::FlatFile => StorageBackend::FlatFile,
        }
    }
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Name of the new store
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Description of the store
    #[arg(long)]
    pub description: Option<String>,

    /// Icon name of the store
    #[arg(long)]
    pub icon: Option<String>,

    /// Encryption algorithm (defaults to the config file setting)
    #[arg(long, value_enum)]
    pub algorithm: Option<AlgorithmChoice>,

    /// Storage backend (defaults to the config file setting)
    #[arg(long, value_enum)]
    pub backend: Option<BackendChoice>,

    /// Allow biometric unlock on devices that support it
    #[arg(long)]
    pub allow_biometrics: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A single store selector
#[derive(Args)]
pub struct StoreArg {
    /// Store name or id (full UUID or prefix)
    #[arg(value_name = "STORE")]
    pub store: String,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Store name or id (full UUID or prefix)
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print entry passwords instead of masking them
    #[arg(long)]
    pub reveal: bool,
}

/// Fields shared by every `add-*` command
#[derive(Args)]
pub struct NewItemArgs {
    /// Store name or id (full UUID or prefix)
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Name of the new item
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Id of the folder to add into (defaults to the store root)
    #[arg(long, value_name = "FOLDER_ID")]
    pub parent: Option<String>,

    /// Description of the item
    #[arg(long)]
    pub description: Option<String>,

    /// Icon name of the item
    #[arg(long)]
    pub icon: Option<String>,
}

/// Arguments for the `add-folder` command
#[derive(Args)]
pub struct AddFolderArgs {
    #[command(flatten)]
    pub item: NewItemArgs,
}

/// Arguments for the `add-entry` command
#[derive(Args)]
pub struct AddEntryArgs {
    #[command(flatten)]
    pub item: NewItemArgs,

    /// Username
    #[arg(long)]
    pub username: Option<String>,

    /// Secret to store (prompted for when omitted and a TTY is available)
    #[arg(long, env = "STRONGBOX_ENTRY_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// URL
    #[arg(long)]
    pub url: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for the `add-document` command
#[derive(Args)]
pub struct AddDocumentArgs {
    #[command(flatten)]
    pub item: NewItemArgs,

    /// File to read the document from
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Document type tag (defaults to the file extension)
    #[arg(long = "type", value_name = "TYPE")]
    pub doc_type: Option<String>,
}

/// Arguments for the `add-image` command
#[derive(Args)]
pub struct AddImageArgs {
    #[command(flatten)]
    pub item: NewItemArgs,

    /// PNG or JPEG file to read
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// JPEG quality between 0.0 and 1.0
    #[arg(long, default_value_t = 0.9)]
    pub quality: f64,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Store name or id (full UUID or prefix)
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Destination file
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,
}

/// Arguments for the `import` command
#[derive(Args)]
pub struct ImportArgs {
    /// Portable store file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Replace a store with the same id
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Store name or id (full UUID or prefix)
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}
