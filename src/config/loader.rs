//! Configuration loading from disk.
//!
//! A TOML file supplies replacement defaults. The file may be partial: every
//! key it names replaces the matching built-in default, everything else is
//! kept, so the flag and environment layers still apply on top.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode built-in defaults: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error(transparent)]
    Flags(#[from] clap::Error),
}

/// Load a TOML file and lay its values over `base`.
pub fn load_defaults_file(path: &Path, base: ServiceConfig) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let overlay: toml::Table = content.parse()?;

    let mut merged = match toml::Value::try_from(base)? {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };
    merge_tables(&mut merged, overlay);

    let config = toml::Value::Table(merged).try_into()?;
    tracing::debug!(path = %path.display(), "Loaded defaults file");
    Ok(config)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
