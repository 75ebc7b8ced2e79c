use super::models::AppConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

/// Parse the table-grouped TOML form into a flat `AppConfig`.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables =
        toml::from_str(contents).context("Failed to parse config tables")?;
    Ok(tables.into())
}

/// Apply environment overrides. Only `PORT` is recognised; an unparsable value
/// is ignored with a warning.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) => {
                debug!(port, "Using port from PORT environment variable");
                config.port = port;
            }
            Err(err) => warn!(value = %raw, "Ignoring invalid PORT override: {err}"),
        }
    }
    config
}
