// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration, read from the `proxy` key.

use serde::{Deserialize, Serialize};

use crate::backend::{INTERCEPTING, INTERFACE, SUBCLASS};
use crate::logging::config::LoggingConfig;
use crate::rules::RuleConfig;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Backend names in priority order, highest first
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rules applied by `Surrogate::proxy_class_from_config`
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_backends() -> Vec<String> {
    vec![
        INTERCEPTING.to_string(),
        SUBCLASS.to_string(),
        INTERFACE.to_string(),
    ]
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            logging: LoggingConfig::default(),
            rules: Vec::new(),
        }
    }
}
