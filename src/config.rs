//! Engine configuration loaded from TOML or JSON files

use crate::error::{Result, StyleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How deeply function calls may nest before evaluation gives up.
    pub max_function_depth: usize,
    /// How many tokens one evaluation may produce before it gives up.
    pub max_expansion_tokens: usize,
    /// Reuse converted values of declarations that call no functions.
    pub cache_conversions: bool,
    /// Distinct inline style texts kept parsed before the cache is emptied.
    pub inline_cache_limit: usize,
    /// `--name` to CSS text, visible to every `var()` evaluation.
    pub custom_properties: BTreeMap<String, String>,
    pub user_agent_stylesheets: Vec<PathBuf>,
    pub user_stylesheets: Vec<PathBuf>,
    pub author_stylesheets: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_function_depth: crate::functions::DEFAULT_MAX_DEPTH,
            max_expansion_tokens: crate::functions::DEFAULT_MAX_EXPANSION,
            cache_conversions: true,
            inline_cache_limit: crate::cascade::DEFAULT_INLINE_CACHE_LIMIT,
            custom_properties: BTreeMap::new(),
            user_agent_stylesheets: Vec::new(),
            user_stylesheets: Vec::new(),
            author_stylesheets: Vec::new(),
        }
    }
}

pub fn load(config_path: impl AsRef<Path>) -> Result<EngineConfig> {
    let config_path = config_path.as_ref();
    let config_content = fs::read_to_string(config_path)?;

    let config: EngineConfig = match config_path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            serde_json::from_str(&config_content).map_err(|e| StyleError::InvalidFormat {
                message: format!("Invalid JSON config: {}", e),
            })?
        }
        Some("toml") => toml::from_str(&config_content).map_err(|e| StyleError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })?,
        _ => {
            return Err(StyleError::InvalidFormat {
                message: "Config file must be .json or .toml format".to_string(),
            })
        }
    };

    if let Some(name) = config.custom_properties.keys().find(|k| !k.starts_with("--")) {
        return Err(StyleError::InvalidFormat {
            message: format!("Custom property '{}' must start with '--'", name),
        });
    }

    log::info!("Loaded configuration from {}", config_path.display());
    Ok(config)
}
