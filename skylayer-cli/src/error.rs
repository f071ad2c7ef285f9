//! CLI error handling with user-friendly messages.
//!
//! Wraps library errors, formats them consistently and maps every failure
//! to a non-zero exit code.

use std::fmt;
use std::process;

use skylayer::cache::BlobStoreError;
use skylayer::config::ConfigFileError;
use skylayer::healpix::IndexError;
use skylayer::provider::FetchError;
use skylayer::source::SourceError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Survey catalog could not be loaded
    Catalog(SourceError),
    /// Pixel index out of range
    Index(IndexError),
    /// HTTP client setup failed
    Client(FetchError),
    /// Failed to download a tile
    Download(String),
    /// Disk cache operation failed
    Cache(BlobStoreError),
    /// Failed to write an output file
    FileWrite { path: String, error: String },
    /// Async runtime could not start
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an error message.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) | CliError::Catalog(_) => {
                eprintln!();
                eprintln!("Run 'skylayer sources' to list the available surveys,");
                eprintln!("or 'skylayer config path' to locate the configuration file.");
            }
            CliError::Download(_) => {
                eprintln!();
                eprintln!("Details are in the log file (use --verbose for more).");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Catalog(e) => write!(f, "Failed to load survey catalog: {}", e),
            CliError::Index(e) => write!(f, "Invalid pixel: {}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Download(msg) => write!(f, "Failed to download tile: {}", msg),
            CliError::Cache(e) => write!(f, "Disk cache error: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Catalog(e) => Some(e),
            CliError::Index(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<IndexError> for CliError {
    fn from(e: IndexError) -> Self {
        CliError::Index(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Client(e)
    }
}

impl From<BlobStoreError> for CliError {
    fn from(e: BlobStoreError) -> Self {
        CliError::Cache(e)
    }
}
