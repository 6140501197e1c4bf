//! Scan configuration
//!
//! Every name the scanner relies on lives here. The defaults are the
//! conventional names of a component/renderer pair; a TOML file can override
//! any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to render TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Names, keyword sets and limits used by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Type whose declared fields are searched for the handle; the root's
    /// runtime type when unset
    pub root_base_type: Option<String>,
    /// Required field on the root holding the handle
    pub handle_field: String,
    /// Required field on the handle holding the scan target
    pub inner_field: String,
    /// Field on the handle holding the component identifier
    pub component_id_field: String,
    /// Field on the target holding the per-component state collection
    pub component_state_field: String,
    /// Historically used registry field names, checked in order
    pub fast_path_names: Vec<String>,
    /// Substrings marking a field or type as registry-like
    pub keywords: Vec<String>,
    /// Substrings identifying a dictionary-family generic definition
    pub map_markers: Vec<String>,
    /// Name of the key type a registry must be keyed by
    pub key_type: String,
    /// Maximum entries sampled per mapping
    pub sample_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_base_type: None,
            handle_field: "_renderHandle".to_string(),
            inner_field: "_renderer".to_string(),
            component_id_field: "_componentId".to_string(),
            component_state_field: "_componentStateById".to_string(),
            fast_path_names: [
                "_eventBindings",
                "_eventHandlers",
                "_eventHandlerIdToCallback",
                "_eventCallbackById",
                "_eventDelegates",
                "_eventBindingsById",
                "_eventHandlerRegistry",
                "_eventDispatcher",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            keywords: vec!["event".to_string(), "handler".to_string()],
            map_markers: vec!["Dictionary".to_string()],
            key_type: "u64".to_string(),
            sample_limit: 5,
        }
    }
}

impl ScanConfig {
    /// Load a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a config from a TOML string; missing keys take defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("handle_field", &self.handle_field),
            ("inner_field", &self.inner_field),
            ("key_type", &self.key_type),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", key)));
            }
        }

        if self.sample_limit == 0 {
            return Err(ConfigError::Invalid(
                "sample_limit must be at least 1".to_string(),
            ));
        }

        if self.map_markers.iter().any(String::is_empty)
            || self.keywords.iter().any(String::is_empty)
        {
            return Err(ConfigError::Invalid(
                "keywords and map_markers cannot contain empty strings".to_string(),
            ));
        }

        Ok(())
    }
}
