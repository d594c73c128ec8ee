use std::fs;
use std::path::{Path, PathBuf};

use crate::io::kv_store::atomic_write;
use crate::model::config::{AppConfig, MAX_CONFIG_DAYS};

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0} (expected section.key, e.g. alerts.window_days)")]
    UnknownKey(String),
    #[error("{key} must be between 0 and {max} days, got {value}")]
    OutOfRange {
        key: &'static str,
        value: i64,
        max: i64,
    },
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file yields
/// defaults and an empty document.
pub fn read_config(data_dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let text = read_text(data_dir)?;
    let config: AppConfig = toml::from_str(&text)?;
    check_ranges(&config)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// The raw document only, with no value checks, so `set_value` can repair a
/// file that `read_config` rejects.
pub fn read_document(data_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    Ok(read_text(data_dir)?.parse()?)
}

fn read_text(data_dir: &Path) -> Result<String, ConfigError> {
    let path = config_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(ConfigError::ReadError { path, source: e }),
    }
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Set `section.key` in the document. Integers and booleans are written
/// as such; anything else as a string. The edited document must still
/// deserialize into an in-range `AppConfig`, otherwise the document is left
/// unchanged.
pub fn set_value(doc: &mut toml_edit::DocumentMut, dotted_key: &str, raw: &str) -> Result<AppConfig, ConfigError> {
    let (section, key) = dotted_key
        .split_once('.')
        .filter(|(s, k)| is_known_key(s, k))
        .ok_or_else(|| ConfigError::UnknownKey(dotted_key.to_string()))?;

    let value = if let Ok(n) = raw.parse::<i64>() {
        toml_edit::value(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        toml_edit::value(b)
    } else {
        toml_edit::value(raw)
    };

    let mut edited = doc.clone();
    if !edited.contains_key(section) {
        edited[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    edited[section][key] = value;

    let config: AppConfig = toml::from_str(&edited.to_string())?;
    check_ranges(&config)?;
    *doc = edited;
    Ok(config)
}

/// Day counts must be non-negative and bounded
fn check_ranges(config: &AppConfig) -> Result<(), ConfigError> {
    let days = [
        ("alerts.window_days", config.alerts.window_days),
        ("sweep.grace_days", config.sweep.grace_days),
    ];
    for (key, value) in days {
        if !(0..=MAX_CONFIG_DAYS).contains(&value) {
            return Err(ConfigError::OutOfRange {
                key,
                value,
                max: MAX_CONFIG_DAYS,
            });
        }
    }
    Ok(())
}

fn is_known_key(section: &str, key: &str) -> bool {
    matches!(
        (section, key),
        ("storage", "key") | ("export", "filename") | ("alerts", "window_days") | ("sweep", "grace_days")
    )
}
