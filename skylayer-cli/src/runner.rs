//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging, resolves the survey and builds
//! the tile manager so command handlers stay short.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use skylayer::cache::{BlobStore, DiskBlobStore};
use skylayer::config::ConfigFile;
use skylayer::download::Downloader;
use skylayer::logging::{default_log_dir, init_logging_with_level, LoggingGuard, DEFAULT_LOG_FILE};
use skylayer::manager::TileManager;
use skylayer::provider::AsyncReqwestClient;
use skylayer::source::{SurveySource, NO_SOURCE_TITLE};
use skylayer::tile::TileImage;

use crate::error::CliError;

/// Tile manager wired to the network and the disk cache.
pub type NetworkManager = TileManager<Downloader<AsyncReqwestClient>>;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Survey id or title overriding the config file
    pub source: Option<String>,
    /// Config file overriding ~/.skylayer/config.ini
    pub config: Option<PathBuf>,
    /// Debug-level logging
    pub verbose: bool,
}

/// Load the config file named by `options`, or the default one.
pub fn load_config(options: &GlobalOptions) -> Result<ConfigFile, CliError> {
    let config = match &options.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Resolve the survey to use: `--source` first, then the config file.
///
/// Returns `None` when the name is the "no survey" title.
pub fn resolve_source(
    config: &ConfigFile,
    cli_source: Option<&str>,
) -> Result<Option<SurveySource>, CliError> {
    let name = cli_source.unwrap_or(&config.survey.source);
    if name == NO_SOURCE_TITLE {
        return Ok(None);
    }
    let catalog = config.catalog()?;
    catalog.find(name).cloned().map(Some).ok_or_else(|| {
        CliError::Config(format!("unknown survey '{}'", name))
    })
}

/// Runner that owns logging and configuration for one command.
pub struct CliRunner {
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    options: GlobalOptions,
}

impl CliRunner {
    /// Load configuration and start logging.
    pub fn new(options: GlobalOptions) -> Result<Self, CliError> {
        let config = load_config(&options)?;
        let level = if options.verbose { "debug" } else { "info" };
        let logging_guard = init_logging_with_level(&default_log_dir(), DEFAULT_LOG_FILE, level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            options,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SkyLayer v{}", env!("CARGO_PKG_VERSION"));
        info!(command, "SkyLayer CLI command");
    }

    /// The survey selected for this run; an error if none is.
    pub fn survey(&self) -> Result<SurveySource, CliError> {
        resolve_source(&self.config, self.options.source.as_deref())?
            .ok_or_else(|| CliError::Config("no survey selected".to_string()))
    }

    /// Open the configured disk blob store.
    pub async fn open_disk_cache(&self) -> Result<DiskBlobStore, CliError> {
        let cache = &self.config.cache;
        Ok(DiskBlobStore::open(&cache.directory, cache.disk_size as u64).await?)
    }

    /// Build a tile manager for `source` backed by reqwest and the disk cache.
    ///
    /// Must be called inside the Tokio runtime.
    pub async fn create_manager(&self, source: SurveySource) -> Result<NetworkManager, CliError> {
        let store: Arc<dyn BlobStore> = Arc::new(self.open_disk_cache().await?);
        let (downloader, events) =
            Downloader::with_reqwest(&self.config.download_config(), Some(store))?;
        let mut manager = TileManager::new(downloader, events, self.config.manager_config());

        info!(id = %source.id, title = %source.title, "Using survey");
        manager.set_source(Some(source));
        Ok(manager)
    }

    /// Write an image as PNG.
    pub fn save_png(&self, path: &Path, image: &TileImage) -> Result<(), CliError> {
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| CliError::FileWrite {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        info!(path = %path.display(), width = image.width(), height = image.height(), "Saved PNG");
        println!("Saved {} ({}x{})", path.display(), image.width(), image.height());
        Ok(())
    }
}

/// Build a multi-threaded Tokio runtime for async commands.
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_source_from_config() {
        let config = ConfigFile::default();
        let source = resolve_source(&config, None).unwrap().unwrap();
        assert_eq!(source.id, "CDS/P/DSS2/color");
    }

    #[test]
    fn test_cli_source_overrides_config() {
        let config = ConfigFile::default();
        let source = resolve_source(&config, Some("CDS/P/2MASS/color")).unwrap().unwrap();
        assert!(source.base_url.contains("2MASS"));
    }

    #[test]
    fn test_none_disables_survey() {
        let config = ConfigFile::default();
        assert!(resolve_source(&config, Some("None")).unwrap().is_none());
    }

    #[test]
    fn test_unknown_survey_is_config_error() {
        let config = ConfigFile::default();
        let err = resolve_source(&config, Some("Nope")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sky.ini");
        std::fs::write(&path, "[survey]\nsource = None\n").unwrap();

        let options = GlobalOptions {
            config: Some(path),
            ..Default::default()
        };
        let config = load_config(&options).unwrap();
        assert_eq!(config.survey.source, "None");
    }
}
