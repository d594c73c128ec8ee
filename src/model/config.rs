use serde::{Deserialize, Serialize};

/// Configuration from config.toml. Every field has a default, so an absent
/// file or section behaves like the template written by `td init`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the workbook blob is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            key: default_storage_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name used by `td export` when no path is given
    #[serde(default = "default_export_filename")]
    pub filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            filename: default_export_filename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Provisional due dates within this many days raise an alert
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Incomplete tasks are archived once their final due date is more
    /// than this many days old
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            grace_days: default_grace_days(),
        }
    }
}

/// Largest accepted value for the day-count settings (about a century)
pub const MAX_CONFIG_DAYS: i64 = 36_500;

/// Fixed local-storage key for the persisted workbook
pub const STORAGE_KEY: &str = "todo-app-data";

/// Default export file name
pub const EXPORT_FILENAME: &str = "todo-app-data.json";

fn default_storage_key() -> String {
    STORAGE_KEY.to_string()
}

fn default_export_filename() -> String {
    EXPORT_FILENAME.to_string()
}

fn default_window_days() -> i64 {
    7
}

fn default_grace_days() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.key, "todo-app-data");
        assert_eq!(config.export.filename, "todo-app-data.json");
        assert_eq!(config.alerts.window_days, 7);
        assert_eq!(config.sweep.grace_days, 1);
    }

    #[test]
    fn partial_sections_fill_in() {
        let config: AppConfig = toml::from_str("[alerts]\nwindow_days = 3\n[sweep]\n").unwrap();
        assert_eq!(config.alerts.window_days, 3);
        assert_eq!(config.sweep.grace_days, 1);
    }
}
