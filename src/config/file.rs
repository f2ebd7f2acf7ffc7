// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-based configuration provider implementation.

use std::fs;
use std::path::{Path, PathBuf};
use serde_json::{Map, Value};

use super::{ConfigError, ConfigProvider, lookup_path};

/// Supported file formats for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON format (.json)
    Json,
    /// TOML format (.toml)
    Toml,
    /// YAML format (.yaml, .yml)
    Yaml,
}

impl FileFormat {
    /// Detect the file format from the file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            _ => None,
        }
    }

    /// Parse file content into a JSON object tree.
    pub fn parse(&self, content: &str) -> Result<Map<String, Value>, ConfigError> {
        let value = match self {
            FileFormat::Json => serde_json::from_str::<Value>(content)
                .map_err(|e| ConfigError::provider_error("file", format!("invalid JSON: {e}")))?,
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::provider_error("file", format!("invalid TOML: {e}")))?;
                serde_json::to_value(toml_value).map_err(|e| {
                    ConfigError::provider_error("file", format!("failed to convert TOML: {e}"))
                })?
            }
            FileFormat::Yaml => {
                let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)
                    .map_err(|e| ConfigError::provider_error("file", format!("invalid YAML: {e}")))?;
                serde_json::to_value(yaml_value).map_err(|e| {
                    ConfigError::provider_error("file", format!("failed to convert YAML: {e}"))
                })?
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::provider_error(
                "file",
                "root configuration must be an object",
            )),
        }
    }
}

/// File-based configuration provider.
#[derive(Debug)]
pub struct FileConfigProvider {
    path: PathBuf,
    format: FileFormat,
    data: Map<String, Value>,
}

impl FileConfigProvider {
    /// Load a JSON, TOML or YAML file, detected by extension.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let path = PathBuf::from(path);
        let format = FileFormat::from_extension(&path)
            .ok_or_else(|| ConfigError::provider_error("file", "unsupported file format"))?;

        let content = fs::read_to_string(&path).map_err(|e| {
            ConfigError::provider_error("file", format!("failed to read {}: {e}", path.display()))
        })?;
        let data = format.parse(&content)?;

        Ok(Self { path, format, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }
}

impl ConfigProvider for FileConfigProvider {
    fn has(&self, key: &str) -> bool {
        lookup_path(&self.data, key).is_some()
    }

    fn provider_name(&self) -> &str {
        "file"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(lookup_path(&self.data, key).cloned())
    }
}
