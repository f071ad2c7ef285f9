//! Disk cache management CLI commands.

use clap::Subcommand;
use skylayer::cache::BlobStore;
use skylayer::config::format_size;

use crate::error::CliError;
use crate::runner::{runtime, CliRunner, GlobalOptions};

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Clear the disk cache, removing all downloaded tiles
    Clear,
    /// Show disk cache statistics
    Stats,
}

/// Run a cache subcommand.
pub fn run(options: GlobalOptions, action: CacheAction) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("cache");
    let rt = runtime()?;
    let store = rt.block_on(runner.open_disk_cache())?;

    match action {
        CacheAction::Clear => {
            println!("Clearing disk cache at: {}", store.directory().display());
            let result = rt.block_on(store.clear())?;
            println!(
                "Deleted {} files, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed as usize)
            );
        }
        CacheAction::Stats => {
            println!("Disk cache: {}", store.directory().display());
            println!("  Size:  {}", format_size(store.size_bytes() as usize));
            println!("  Limit: {}", format_size(store.max_bytes() as usize));
        }
    }
    Ok(())
}
