//! User configuration.
//!
//! `ConfigFile` mirrors `~/.skylayer/config.ini` and converts into the
//! library's own settings types:
//!
//! ```
//! use skylayer::config::ConfigFile;
//!
//! let config = ConfigFile::parse("[render]\ninterpolation = nearest\n").unwrap();
//! let settings = config.render_settings();
//! assert_eq!(settings.interpolation.as_str(), "nearest");
//! ```

mod file;
mod parser;
mod size;
mod writer;

pub use file::{
    config_directory, config_file_path, default_cache_directory, CacheSettings, ConfigFile,
    ConfigFileError, DownloadSettings, RenderFileSettings, SurveySettings,
    DEFAULT_DISK_CACHE_SIZE, DEFAULT_MEMORY_CACHE_SIZE, DEFAULT_RETRY_GRACE_SECS,
    DEFAULT_SOURCE, DEFAULT_TIMEOUT_SECS,
};
pub use size::{format_size, parse_size, Size, SizeParseError};
