//! Configuration loading and database path resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database path resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config_file_key: Option<&str>,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Some(key) = config_file_key {
        if let Ok(config_path) = locate_config_file() {
            if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                    if let Some(db_path) = config.get(key).and_then(|v| v.as_str()) {
                        return Ok(PathBuf::from(db_path));
                    }
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_database_path())
}

/// Locate the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/tabgain/config.toml first, then /etc/tabgain/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("tabgain").join("config.toml"));
        let system_config = PathBuf::from("/etc/tabgain/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("tabgain").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    let data_dir = if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("tabgain"))
    } else {
        dirs::data_local_dir().map(|d| d.join("tabgain"))
    };

    data_dir
        .unwrap_or_else(|| PathBuf::from("./tabgain_data"))
        .join("tabgain.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let path = resolve_database_path(
            Some("/tmp/cli.db"),
            "TABGAIN_TEST_UNSET_DB",
            None,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cli.db"));
    }

    #[test]
    fn test_default_path_has_db_filename() {
        let path = resolve_database_path(None, "TABGAIN_TEST_UNSET_DB", None).unwrap();
        assert_eq!(path.file_name().unwrap(), "tabgain.db");
    }
}
