use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{MappingError, MappingResult};
use crate::mapping::DEFAULT_DATE_FORMAT;

/// Environment variable naming the engine configuration file
pub const CONFIG_ENV_VAR: &str = "INTEGRATION_CONFIG";
/// Configuration file used when neither a path nor the env var is given
pub const DEFAULT_CONFIG_PATH: &str = "config/integration_config.json";

/// Configuration for the integration engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Mapping project whose schema the entry point uses
    #[serde(default = "default_mapping_project_id")]
    pub mapping_project_id: String,
    /// Name reported with every error record
    #[serde(default = "default_script_id")]
    pub script_id: String,
    /// Date pattern used when the company configuration has none
    #[serde(default = "default_date_format")]
    pub default_date_format: String,
    /// Report failures to the error sink
    #[serde(default = "default_true")]
    pub log_errors: bool,
    /// Also store failures as error-log records in the record store
    #[serde(default)]
    pub persist_error_records: bool,
    /// Record type of persisted error-log records
    #[serde(default = "default_error_record_type")]
    pub error_record_type: String,
}

fn default_mapping_project_id() -> String {
    "1".to_string()
}

fn default_script_id() -> String {
    "integration_mapper".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_error_record_type() -> String {
    "customrecord_error_log".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mapping_project_id: default_mapping_project_id(),
            script_id: default_script_id(),
            default_date_format: default_date_format(),
            log_errors: true,
            persist_error_records: false,
            error_record_type: default_error_record_type(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given mapping project
    pub fn new(mapping_project_id: &str) -> Self {
        Self {
            mapping_project_id: mapping_project_id.to_string(),
            ..Default::default()
        }
    }

    /// Check that every required setting is present
    pub fn validate(&self) -> MappingResult<()> {
        if self.mapping_project_id.trim().is_empty() {
            return Err(MappingError::configuration(
                "Integration Project record was not configured properly.",
            ));
        }
        if self.default_date_format.trim().is_empty() {
            return Err(MappingError::configuration(
                "Default date format cannot be empty",
            ));
        }
        if self.persist_error_records && self.error_record_type.trim().is_empty() {
            return Err(MappingError::configuration(
                "Error record type cannot be empty when error records are persisted",
            ));
        }
        Ok(())
    }
}

/// Load an engine configuration from the given path or from the
/// `INTEGRATION_CONFIG` environment variable.
///
/// Files ending in `.toml` are read as TOML, anything else as JSON. If the
/// file does not exist, a default [`EngineConfig`] is returned.
pub fn load_engine_config(path: Option<&str>) -> MappingResult<EngineConfig> {
    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config_str = match fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(_) => {
            log::info!(
                "No engine configuration at {}, using defaults",
                config_path
            );
            return Ok(EngineConfig::default());
        }
    };

    let is_toml = Path::new(&config_path)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        toml::from_str::<EngineConfig>(&config_str).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<EngineConfig>(&config_str).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(config) => Ok(config),
        Err(e) => {
            log::error!("Failed to parse engine configuration: {}", e);
            Err(MappingError::configuration(format!(
                "Invalid configuration file {}: {}",
                config_path, e
            )))
        }
    }
}
