// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Environment variable-based configuration provider implementation.
//!
//! `SURROGATE_PROXY__LOGGING__LEVEL=debug` becomes `proxy.logging.level`:
//! the prefix is stripped, the rest is lower-cased and `__` separates
//! nesting levels.  Single underscores are kept, so keys such as
//! `include_location` survive.

use std::env;
use serde_json::{Map, Value, json};

use super::{ConfigError, ConfigProvider, insert_path, lookup_path};

/// Separator between nesting levels in variable names.
const NESTING_SEPARATOR: &str = "__";

/// Configuration provider that retrieves values from environment variables.
#[derive(Debug)]
pub struct EnvConfigProvider {
    /// Prefix for environment variables (e.g., "SURROGATE_").
    prefix: String,
    /// Matching variables, as a nested tree.
    tree: Map<String, Value>,
}

impl EnvConfigProvider {
    /// Create a new environment variable configuration provider with the specified prefix.
    pub fn new(prefix: &str) -> Self {
        let mut provider = Self {
            prefix: prefix.to_string(),
            tree: Map::new(),
        };
        provider.refresh();
        provider
    }

    /// Re-read the environment.
    pub fn refresh(&mut self) {
        self.tree.clear();

        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with(&self.prefix))
            .collect();
        // Shorter paths first so a scalar never replaces an already built subtree
        vars.sort_by_key(|(key, _)| key.matches(NESTING_SEPARATOR).count());

        for (key, value) in vars {
            let path: Vec<String> = key[self.prefix.len()..]
                .to_lowercase()
                .split(NESTING_SEPARATOR)
                .map(str::to_string)
                .collect();
            if path.iter().any(|p| p.is_empty()) {
                continue;
            }
            insert_path(&mut self.tree, &path, Self::parse_value(&value));
        }
    }

    /// Parse a string value into a JSON Value.
    fn parse_value(value: &str) -> Value {
        if let Ok(json_value) = serde_json::from_str(value) {
            return json_value;
        }

        if value.eq_ignore_ascii_case("true") {
            return json!(true);
        } else if value.eq_ignore_ascii_case("false") {
            return json!(false);
        }

        json!(value)
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new("SURROGATE_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn has(&self, key: &str) -> bool {
        lookup_path(&self.tree, key).is_some()
    }

    fn provider_name(&self) -> &str {
        "env"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(lookup_path(&self.tree, key).cloned())
    }
}
