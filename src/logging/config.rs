// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for logging, read from `proxy.logging`.

use crate::logging::structured::{LogFormat, LoggerConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logging settings under `proxy.logging`. Missing keys take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Route `log` records through slog instead of env_logger
    pub structured: bool,
    /// `terminal` or `json`; anything else is terminal
    pub format: String,
    /// trace, debug, info, warn, error or critical
    pub level: String,
    pub include_location: bool,
    pub include_thread_id: bool,
    /// Key/value pairs attached to every structured record
    pub static_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            structured: false,
            format: "terminal".to_string(),
            level: "info".to_string(),
            include_location: true,
            include_thread_id: true,
            static_fields: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// The `log` filter for the configured level; unknown names mean `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "critical" => LevelFilter::Error,
            other => other.parse().unwrap_or(LevelFilter::Info),
        }
    }

    fn slog_level(&self) -> slog::Level {
        if self.level.eq_ignore_ascii_case("critical") {
            return slog::Level::Critical;
        }
        match self.level_filter() {
            LevelFilter::Trace => slog::Level::Trace,
            LevelFilter::Debug => slog::Level::Debug,
            LevelFilter::Warn => slog::Level::Warning,
            LevelFilter::Error => slog::Level::Error,
            LevelFilter::Info | LevelFilter::Off => slog::Level::Info,
        }
    }

    pub fn to_logger_config(&self) -> LoggerConfig {
        let format = if self.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Terminal
        };
        LoggerConfig {
            format,
            level: self.slog_level(),
            include_location: self.include_location,
            include_thread_id: self.include_thread_id,
            static_fields: self.static_fields.clone().into_iter().collect(),
        }
    }
}
