//! Configuration file handling for ~/.skylayer/config.ini.
//!
//! Loads and saves user configuration with defaults for every key. Parsing
//! lives in [`super::parser`] and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::cache::DEFAULT_DISK_BYTES;
use crate::download::DownloadConfig;
use crate::manager::{TileManagerConfig, DEFAULT_RETRY_GRACE};
use crate::provider::DEFAULT_TIMEOUT;
use crate::render::{Interpolation, RenderSettings, DEFAULT_SUBDIVISION};
use crate::source::{SourceCatalog, SourceError};

/// Default memory cache budget: 256 MB of decoded pixels.
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = crate::cache::DEFAULT_MAX_COST;

/// Default disk cache budget: 2 GB.
pub const DEFAULT_DISK_CACHE_SIZE: usize = DEFAULT_DISK_BYTES as usize;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

/// Default retry grace period in seconds.
pub const DEFAULT_RETRY_GRACE_SECS: u64 = DEFAULT_RETRY_GRACE.as_secs();

/// Survey selected when the file names none.
pub const DEFAULT_SOURCE: &str = "CDS/P/DSS2/color";

const CONFIG_DIR_NAME: &str = ".skylayer";
const CONFIG_FILE_NAME: &str = "config.ini";
const CACHE_DIR_NAME: &str = "skylayer";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Malformed INI text
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// Failed to write the config file or its directory
    #[error("Failed to write config file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub render: RenderFileSettings,
    pub survey: SurveySettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Decoded tile budget in bytes
    pub memory_size: usize,
    /// Disk blob store directory
    pub directory: PathBuf,
    /// Disk blob store budget in bytes
    pub disk_size: usize,
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub timeout_secs: u64,
    pub retry_grace_secs: u64,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFileSettings {
    pub interpolation: Interpolation,
    pub subdivision: u32,
    pub opacity: f32,
}

/// `[survey]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveySettings {
    /// Catalog id or title of the active survey
    pub source: String,
    /// JSON catalog replacing the built-in one
    pub catalog: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
                directory: default_cache_directory(),
                disk_size: DEFAULT_DISK_CACHE_SIZE,
            },
            download: DownloadSettings {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                retry_grace_secs: DEFAULT_RETRY_GRACE_SECS,
            },
            render: RenderFileSettings {
                interpolation: Interpolation::default(),
                subdivision: DEFAULT_SUBDIVISION,
                opacity: 1.0,
            },
            survey: SurveySettings {
                source: DEFAULT_SOURCE.to_string(),
                catalog: None,
            },
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.skylayer/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, super::writer::to_config_string(self))?;
        Ok(())
    }

    /// Write the default config file unless one exists. Returns its path.
    pub fn ensure_exists(path: &Path) -> Result<PathBuf, ConfigFileError> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }
        Ok(path.to_path_buf())
    }

    /// Tile manager settings derived from `[cache]` and `[download]`.
    pub fn manager_config(&self) -> TileManagerConfig {
        TileManagerConfig::default()
            .with_max_cost(self.cache.memory_size)
            .with_retry_grace(Duration::from_secs(self.download.retry_grace_secs))
    }

    /// Downloader settings derived from `[download]`.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::default().with_timeout(Duration::from_secs(self.download.timeout_secs))
    }

    /// Rasterizer settings derived from `[render]`.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings::default()
            .with_interpolation(self.render.interpolation)
            .with_subdivision(self.render.subdivision)
            .with_opacity(self.render.opacity)
    }

    /// The configured catalog file, or the built-in catalog.
    pub fn catalog(&self) -> Result<SourceCatalog, SourceError> {
        match &self.survey.catalog {
            Some(path) => SourceCatalog::load(path),
            None => Ok(SourceCatalog::builtin()),
        }
    }
}

/// Path to the config directory (~/.skylayer).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to the config file (~/.skylayer/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Platform cache directory for the disk blob store.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(CACHE_DIR_NAME)
}
