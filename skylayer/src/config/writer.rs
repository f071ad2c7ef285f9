//! INI serialization: `ConfigFile` to the commented text written to disk.

use std::path::Path;

use super::file::ConfigFile;
use super::size::format_size;

/// Render a `ConfigFile` as a commented INI document.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let catalog = config
        .survey
        .catalog
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[cache]
; Decoded tiles kept in memory (default: 256MB)
; Supports: KB, MB, GB suffixes
memory_size = {}
; Directory of the persistent download cache
directory = {}
; Download cache size (default: 2GB)
disk_size = {}

[download]
; Per-request timeout in seconds
timeout_secs = {}
; Seconds before a failed tile is requested again
retry_grace_secs = {}

[render]
; Texture sampling: nearest or bilinear
interpolation = {}
; Quad subdivision per tile edge (1-64)
subdivision = {}
; Survey opacity (0.0-1.0)
opacity = {}

[survey]
; Survey id or title from the catalog, or None to disable
source = {}
; Optional JSON catalog replacing the built-in surveys
catalog = {}
"#,
        format_size(config.cache.memory_size),
        path_to_string(&config.cache.directory),
        format_size(config.cache.disk_size),
        config.download.timeout_secs,
        config.download.retry_grace_secs,
        config.render.interpolation,
        config.render.subdivision,
        config.render.opacity,
        config.survey.source,
        catalog,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
