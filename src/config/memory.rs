// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory configuration provider, for settings assembled in code.

use serde_json::{Map, Value};

use super::{ConfigError, ConfigProvider, insert_path, lookup_path};

/// Configuration provider over a JSON object tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    data: Map<String, Value>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object; any other value yields an error.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            _ => Err(ConfigError::provider_error(
                "memory",
                "root configuration must be an object",
            )),
        }
    }

    /// Set a value at a dot-separated key, creating intermediate objects.
    pub fn set<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        let path: Vec<String> = key.split('.').map(str::to_string).collect();
        insert_path(&mut self.data, &path, value.into());
        self
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn has(&self, key: &str) -> bool {
        lookup_path(&self.data, key).is_some()
    }

    fn provider_name(&self) -> &str {
        "memory"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(lookup_path(&self.data, key).cloned())
    }
}
