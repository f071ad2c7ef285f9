//! Configuration management CLI commands.
//!
//! Provides `config init`, `config list` and `config path`.

use std::path::PathBuf;

use clap::Subcommand;
use skylayer::config::{config_file_path, format_size, ConfigFile};

use crate::error::CliError;
use crate::runner::{load_config, GlobalOptions};

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file if none exists
    Init,
    /// List all configuration settings
    List,
    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(options: &GlobalOptions, command: ConfigCommands) -> Result<(), CliError> {
    let path = options.config.clone().unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Init => run_init(path),
        ConfigCommands::List => run_list(options),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn run_init(path: PathBuf) -> Result<(), CliError> {
    let existed = path.exists();
    ConfigFile::ensure_exists(&path)?;
    if existed {
        println!("Configuration already exists: {}", path.display());
    } else {
        println!("Wrote default configuration: {}", path.display());
    }
    Ok(())
}

fn run_list(options: &GlobalOptions) -> Result<(), CliError> {
    let config = load_config(options)?;
    for line in settings_lines(&config) {
        println!("{}", line);
    }
    Ok(())
}

fn settings_lines(config: &ConfigFile) -> Vec<String> {
    let catalog = config
        .survey
        .catalog
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(built-in)".to_string());

    vec![
        "[cache]".to_string(),
        format!("  memory_size = {}", format_size(config.cache.memory_size)),
        format!("  directory = {}", config.cache.directory.display()),
        format!("  disk_size = {}", format_size(config.cache.disk_size)),
        String::new(),
        "[download]".to_string(),
        format!("  timeout_secs = {}", config.download.timeout_secs),
        format!("  retry_grace_secs = {}", config.download.retry_grace_secs),
        String::new(),
        "[render]".to_string(),
        format!("  interpolation = {}", config.render.interpolation),
        format!("  subdivision = {}", config.render.subdivision),
        format!("  opacity = {}", config.render.opacity),
        String::new(),
        "[survey]".to_string(),
        format!("  source = {}", config.survey.source),
        format!("  catalog = {}", catalog),
    ]
}
