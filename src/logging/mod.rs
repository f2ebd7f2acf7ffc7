// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Logging utilities.
//!
//! The crate logs through the `log` facade (see the `*_fmt!` macros).  The
//! embedding application may install its own logger; otherwise
//! [`init`] sets up `env_logger`, and [`init_with_config`] can switch to
//! structured slog output as configured under `proxy.logging`.

pub mod config;
pub mod structured;
mod wrapper;


use log::{LevelFilter, error, info};
use once_cell::sync::OnceCell;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use self::config::LoggingConfig;
use self::structured::LoggerGuard;

static INIT: Once = Once::new();

/// Set once structured logging owns the `log` facade.
pub(crate) static USING_STRUCTURED: AtomicBool = AtomicBool::new(false);

static STRUCTURED_GUARD: OnceCell<LoggerGuard> = OnceCell::new();

/// Initialize logging with the specified level.
///
/// This function ensures logging is only initialized once.
pub fn init(level: Option<LevelFilter>) {
    init_with_config(level.unwrap_or(LevelFilter::Info), &LoggingConfig::default());
}

/// Initialize logging from a [`LoggingConfig`].
///
/// Only the first call installs a logger; later calls just adjust the
/// maximum level.  A logger installed by the host application is left alone.
pub fn init_with_config(level: LevelFilter, config: &LoggingConfig) {
    INIT.call_once(|| {
        if config.structured && init_structured(level, config) {
            USING_STRUCTURED.store(true, Ordering::SeqCst);
        } else {
            init_env_logger(level);
        }
        info!("Logging initialized at level: {level}");
    });
    log::set_max_level(level);
}

fn init_structured(level: LevelFilter, config: &LoggingConfig) -> bool {
    let Some(bridge_level) = level.to_level() else {
        return false;
    };
    STRUCTURED_GUARD.get_or_init(|| structured::init_global_logger(&config.to_logger_config()));
    slog_stdlog::init_with_level(bridge_level).is_ok()
}

fn init_env_logger(level: LevelFilter) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level.as_str().to_lowercase());

    // Fails when the host already installed a logger, which is fine
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(true)
        .try_init();
}

/// Whether records are currently routed through slog.
pub fn is_structured_logging() -> bool {
    USING_STRUCTURED.load(Ordering::SeqCst)
}

/// Log an error with context and return the error.
///
/// This is useful for logging errors in a chain of Results.
pub fn log_error<E: std::fmt::Display>(context: &str, err: E) -> E {
    error!("[{}] {}", context, err);
    err
}
