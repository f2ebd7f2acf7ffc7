// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration subsystem
//!
//! An engine is assembled from an ordered list of [`ConfigProvider`]s; later
//! providers override earlier ones.  Typical stacking order:
//!
//! 1. `FileConfigProvider`   – `surrogate.{toml,json,yaml}`
//! 2. `EnvConfigProvider`    – `SURROGATE_PROXY__BACKENDS='["subclass"]'`
//! 3. `MemoryConfigProvider` – values set in code
//!
//! First-class configuration keys:
//!
//! | key             | type      | default                                     | description                       |
//! |-----------------|-----------|---------------------------------------------|-----------------------------------|
//! | `proxy.backends`| *array*   | `["intercepting", "subclass", "interface"]` | Backend priority, highest first   |
//! | `proxy.logging` | *object*  | see [`LoggingConfig`]                        | Log output settings               |
//! | `proxy.rules`   | *array*   | `[]`                                        | Rules declared in configuration   |
//!
//! [`LoggingConfig`]: crate::logging::config::LoggingConfig

mod env;
pub mod error;
mod file;
mod memory;
mod proxy;


pub use env::EnvConfigProvider;
pub use error::ConfigError;
pub use file::{FileConfigProvider, FileFormat};
pub use memory::MemoryConfigProvider;
pub use proxy::ProxyConfig;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Core configuration provider trait that all configuration sources must implement.
/// This trait is object-safe since it doesn't contain generic methods.
pub trait ConfigProvider: Debug + Send + Sync {
    /// Check if the configuration provider has a value for the given key.
    fn has(&self, key: &str) -> bool;

    /// Get the name of the configuration provider for debugging purposes.
    fn provider_name(&self) -> &str;

    /// Get a raw configuration value by dot-separated key.
    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError>;
}

/// Typed access on top of [`ConfigProvider`]. Not object-safe.
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a configuration value by key and deserialize it to the specified type.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get_raw(key)?.map(|value| deserialize(key, value)).transpose()
    }
}

impl<T: ConfigProvider> ConfigProviderExt for T {}

fn deserialize<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value)
        .map_err(|e| ConfigError::ParseError(format!("failed to deserialize '{key}': {e}")))
}

/// Look up a dot-separated path in a JSON object tree.
pub(crate) fn lookup_path<'a>(root: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

/// Insert `value` at `path`, replacing scalars that stand in the way.
pub(crate) fn insert_path(tree: &mut serde_json::Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            tree.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let child = tree
                .entry(head.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if !child.is_object() {
                *child = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

/// Builder for the configuration system.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration provider; it overrides the ones added before it.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add an already shared provider.
    pub fn with_shared_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> Config {
        Config {
            providers: self.providers,
        }
    }
}

/// Layered configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// A configuration with no providers; every key falls back to defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Names of the providers, lowest priority first.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        // Later providers override earlier ones
        for provider in self.providers.iter().rev() {
            if provider.has(key) {
                return provider.get_raw(key);
            }
        }
        Ok(None)
    }

    /// Get a configuration value from the highest priority provider that has it.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get_raw(key)?.map(|value| deserialize(key, value)).transpose()
    }

    /// Get a configuration value by key with a default fallback value.
    pub fn get_or_default<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Configuration backed by a single file.
    pub fn default_file(file_path: &str) -> Result<Self, ConfigError> {
        let provider = FileConfigProvider::new(file_path)?;
        Ok(Self::builder().with_provider(provider).build())
    }
}
