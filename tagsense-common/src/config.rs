//! Configuration file resolution and loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Config file name looked up inside the per-user and system directories
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory (`<config_dir>/<app_dir>/config.toml`)
/// 4. System config directory (`/etc/<app_dir>/config.toml`, unix only)
///
/// Returns `Ok(None)` when nothing was given and no default file exists, so
/// the caller can fall back to built-in defaults. An explicitly named file
/// (CLI or env) that does not exist is an error.
pub fn resolve_config_file(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    app_dir: &str,
) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return require_existing(PathBuf::from(path));
        }
    }

    // Priority 3/4: platform locations
    Ok(default_config_locations(app_dir)
        .into_iter()
        .find(|p| p.exists()))
}

fn require_existing(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Candidate config file locations for the platform, most specific first
pub fn default_config_locations(app_dir: &str) -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join(app_dir).join(CONFIG_FILE_NAME));
    }

    if cfg!(unix) {
        locations.push(PathBuf::from("/etc").join(app_dir).join(CONFIG_FILE_NAME));
    }

    locations
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))
}
