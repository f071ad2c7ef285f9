//! INI parsing: the single place where key names map to `ConfigFile` fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};
use super::size::parse_size;
use crate::render::Interpolation;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays the values present.
/// Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = size_value("cache", "memory_size", v)?;
        }
        if let Some(v) = section.get("disk_size") {
            config.cache.disk_size = size_value("cache", "disk_size", v)?;
        }
    }

    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout_secs") {
            config.download.timeout_secs = v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid("download", "timeout_secs", v, "must be a positive integer (seconds)"))?;
        }
        if let Some(v) = section.get("retry_grace_secs") {
            config.download.retry_grace_secs = v
                .trim()
                .parse()
                .map_err(|_| invalid("download", "retry_grace_secs", v, "must be a non-negative integer (seconds)"))?;
        }
    }

    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("interpolation") {
            config.render.interpolation = v
                .parse::<Interpolation>()
                .map_err(|_| invalid("render", "interpolation", v, "must be 'nearest' or 'bilinear'"))?;
        }
        if let Some(v) = section.get("subdivision") {
            config.render.subdivision = v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=crate::render::MAX_SUBDIVISION).contains(n))
                .ok_or_else(|| invalid("render", "subdivision", v, "must be an integer between 1 and 64"))?;
        }
        if let Some(v) = section.get("opacity") {
            config.render.opacity = v
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|o| (0.0..=1.0).contains(o))
                .ok_or_else(|| invalid("render", "opacity", v, "must be a number between 0.0 and 1.0"))?;
        }
    }

    if let Some(section) = ini.section(Some("survey")) {
        if let Some(v) = non_empty(section, "source") {
            config.survey.source = v.to_string();
        }
        config.survey.catalog = non_empty(section, "catalog").map(expand_tilde);
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn size_value(section: &str, key: &str, value: &str) -> Result<usize, ConfigFileError> {
    parse_size(value).map_err(|_| invalid(section, key, value, "expected format like '2GB', '256MB', or '1024KB'"))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(ConfigFile::parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_all_sections() {
        let config = ConfigFile::parse(
            "[cache]\n\
             memory_size = 512MB\n\
             directory = /var/cache/sky\n\
             disk_size = 10GB\n\
             [download]\n\
             timeout_secs = 15\n\
             retry_grace_secs = 0\n\
             [render]\n\
             interpolation = Nearest\n\
             subdivision = 8\n\
             opacity = 0.25\n\
             [survey]\n\
             source = Fermi color\n\
             catalog = /etc/skylayer/surveys.json\n",
        )
        .unwrap();

        assert_eq!(config.cache.memory_size, 512 * 1024 * 1024);
        assert_eq!(config.cache.directory, PathBuf::from("/var/cache/sky"));
        assert_eq!(config.cache.disk_size, 10 * 1024 * 1024 * 1024);
        assert_eq!(config.download.timeout_secs, 15);
        assert_eq!(config.download.retry_grace_secs, 0);
        assert_eq!(config.render.interpolation, Interpolation::Nearest);
        assert_eq!(config.render.subdivision, 8);
        assert!((config.render.opacity - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.survey.source, "Fermi color");
        assert_eq!(
            config.survey.catalog,
            Some(PathBuf::from("/etc/skylayer/surveys.json"))
        );
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = ConfigFile::parse("[cache]\ndirectory =\n[survey]\nsource =\ncatalog =\n").unwrap();
        let defaults = ConfigFile::default();
        assert_eq!(config.cache.directory, defaults.cache.directory);
        assert_eq!(config.survey, defaults.survey);
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("[cache]\nmemory_size = lots\n", "memory_size"),
            ("[download]\ntimeout_secs = 0\n", "timeout_secs"),
            ("[download]\nretry_grace_secs = -3\n", "retry_grace_secs"),
            ("[render]\ninterpolation = cubic\n", "interpolation"),
            ("[render]\nsubdivision = 0\n", "subdivision"),
            ("[render]\nopacity = 1.5\n", "opacity"),
        ];
        for (text, expected_key) in cases {
            match ConfigFile::parse(text) {
                Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{} should be invalid, got {:?}", expected_key, other),
            }
        }
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        if dirs::home_dir().is_some() {
            assert_eq!(expand_tilde("~/sky"), home.join("sky"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel/~x"), PathBuf::from("rel/~x"));
    }
}
