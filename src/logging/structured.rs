// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured logging on top of slog, with terminal or JSON output.

use slog::{Drain, FnValue, Logger, Record, o};
use slog_async::Async;
use slog_json::Json;
use slog_term::{FullFormat, TermDecorator};
use std::io;

/// Structured logging format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable terminal output
    Terminal,
    /// JSON formatted output
    Json,
}

/// Structured logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Output format (Terminal or JSON)
    pub format: LogFormat,
    /// Log level
    pub level: slog::Level,
    /// Whether to include source code location
    pub include_location: bool,
    /// Whether to include thread ID
    pub include_thread_id: bool,
    /// Additional static key-value pairs to include in all logs
    pub static_fields: Vec<(String, String)>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            level: slog::Level::Info,
            include_location: true,
            include_thread_id: true,
            static_fields: Vec::new(),
        }
    }
}

/// Create a structured logger with the given configuration
pub fn create_logger(config: &LoggerConfig) -> Logger {
    let root = match config.format {
        LogFormat::Terminal => {
            let decorator = TermDecorator::new().build();
            let drain = FullFormat::new(decorator).build().fuse();
            let drain = drain.filter_level(config.level).fuse();
            Logger::root(Async::new(drain).build().fuse(), o!())
        }
        LogFormat::Json => {
            let drain = Json::new(io::stdout()).add_default_keys().build().fuse();
            let drain = drain.filter_level(config.level).fuse();
            Logger::root(Async::new(drain).build().fuse(), o!())
        }
    };
    with_context_fields(root, config)
}

/// Attach location, thread and static fields to `logger`.
pub fn with_context_fields(logger: Logger, config: &LoggerConfig) -> Logger {
    let mut logger = logger;

    if config.include_location {
        logger = logger.new(o!(
            "location" => FnValue(|record: &Record| format!("{}:{}", record.file(), record.line()))
        ));
    }
    if config.include_thread_id {
        logger = logger.new(o!(
            "thread" => FnValue(|_: &Record| format!("{:?}", std::thread::current().id()))
        ));
    }

    for (key, value) in &config.static_fields {
        // slog keys are 'static; fields are installed once per process
        let key_str: &'static str = Box::leak(key.clone().into_boxed_str());
        logger = logger.new(o!(key_str => value.clone()));
    }

    logger
}

/// Global logger guard that keeps the logger alive
pub struct LoggerGuard {
    _guard: slog_scope::GlobalLoggerGuard,
}

/// Initialize the global structured logger
pub fn init_global_logger(config: &LoggerConfig) -> LoggerGuard {
    let logger = create_logger(config);
    let guard = slog_scope::set_global_logger(logger);

    LoggerGuard { _guard: guard }
}
