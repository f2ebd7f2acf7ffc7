// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in interceptors
//!
//! Interceptors are **opt-in** – they only run for methods bound to the rule
//! that carries them.  Custom interceptors can be made available to
//! configuration-declared rules with [`register_interceptor`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use log::Level;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::Interceptor;
use crate::core::{MethodDescriptor, ProxyError, Value};
use crate::proxy::{Instance, SuperInvoke};
use crate::{debug_fmt, error_fmt, info_fmt, trace_fmt, warn_fmt};

type HandlerFn =
    dyn Fn(&Instance, &MethodDescriptor, &SuperInvoke<'_>, &[Value]) -> Result<Value, ProxyError>
        + Send
        + Sync;

/// An interceptor backed by a closure.
pub struct FnInterceptor {
    name: String,
    handler: Box<HandlerFn>,
}

impl FnInterceptor {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&Instance, &MethodDescriptor, &SuperInvoke<'_>, &[Value]) -> Result<Value, ProxyError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Box::new(handler),
        }
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").field("name", &self.name).finish()
    }
}

impl Interceptor for FnInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn intercept(
        &self,
        instance: &Instance,
        method: &MethodDescriptor,
        super_invoke: &SuperInvoke<'_>,
        args: &[Value],
    ) -> Result<Value, ProxyError> {
        (self.handler)(instance, method, super_invoke, args)
    }
}

/// Configuration for a logging interceptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingInterceptorConfig {
    /// Whether to log call arguments
    #[serde(default = "default_true")]
    pub log_arguments: bool,

    /// Whether to log the returned value
    #[serde(default = "default_false")]
    pub log_result: bool,

    /// Log level to use
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_log_level() -> String {
    "trace".to_string()
}

impl Default for LoggingInterceptorConfig {
    fn default() -> Self {
        Self {
            log_arguments: true,
            log_result: false,
            log_level: default_log_level(),
        }
    }
}

/// Logs each call, then forwards to the original behavior.
#[derive(Debug)]
pub struct LoggingInterceptor {
    config: LoggingInterceptorConfig,
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new(LoggingInterceptorConfig::default())
    }
}

impl LoggingInterceptor {
    pub fn new(config: LoggingInterceptorConfig) -> Self {
        Self { config }
    }

    fn get_log_level(&self) -> Level {
        match self.config.log_level.to_lowercase().as_str() {
            "error" => Level::Error,
            "warn" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            _ => Level::Trace,
        }
    }

    fn log(&self, message: &str) {
        match self.get_log_level() {
            Level::Error => error_fmt!("LoggingInterceptor", "{}", message),
            Level::Warn => warn_fmt!("LoggingInterceptor", "{}", message),
            Level::Info => info_fmt!("LoggingInterceptor", "{}", message),
            Level::Debug => debug_fmt!("LoggingInterceptor", "{}", message),
            Level::Trace => trace_fmt!("LoggingInterceptor", "{}", message),
        }
    }
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    fn intercept(
        &self,
        instance: &Instance,
        method: &MethodDescriptor,
        super_invoke: &SuperInvoke<'_>,
        args: &[Value],
    ) -> Result<Value, ProxyError> {
        if self.config.log_arguments {
            self.log(&format!("{}::{} args={:?}", instance.type_name(), method.signature, args));
        } else {
            self.log(&format!("{}::{}", instance.type_name(), method.signature));
        }

        let result = super_invoke.invoke(args)?;

        if self.config.log_result {
            self.log(&format!("{}::{} -> {}", instance.type_name(), method.signature, result));
        }
        Ok(result)
    }
}

/// Constructor signature every dynamic interceptor must implement
pub type InterceptorConstructor = fn(serde_json::Value) -> Result<Arc<dyn Interceptor>, ProxyError>;

static INTERCEPTOR_REGISTRY: Lazy<RwLock<HashMap<String, InterceptorConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register an interceptor under a unique name for configuration-declared rules.
pub fn register_interceptor(name: &str, ctor: InterceptorConstructor) {
    INTERCEPTOR_REGISTRY.write().insert(name.to_string(), ctor);
}

fn get_registered_interceptor(name: &str) -> Option<InterceptorConstructor> {
    INTERCEPTOR_REGISTRY.read().get(name).copied()
}

/// Factory for creating interceptors based on configuration.
#[derive(Debug)]
pub struct InterceptorFactory;

impl InterceptorFactory {
    pub fn create_interceptor(
        interceptor_type: &str,
        config: serde_json::Value,
    ) -> Result<Arc<dyn Interceptor>, ProxyError> {
        if let Some(ctor) = get_registered_interceptor(interceptor_type) {
            return ctor(config);
        }

        match interceptor_type {
            "logging" => {
                let config = if config.is_null() {
                    LoggingInterceptorConfig::default()
                } else {
                    serde_json::from_value(config).map_err(|e| {
                        ProxyError::UnsupportedRule(format!("Invalid logging interceptor config: {e}"))
                    })?
                };
                Ok(Arc::new(LoggingInterceptor::new(config)))
            }
            _ => {
                let err = ProxyError::UnsupportedRule(format!(
                    "Unknown interceptor type: {interceptor_type}"
                ));
                error_fmt!("InterceptorFactory", "{}", err);
                Err(err)
            }
        }
    }
}
