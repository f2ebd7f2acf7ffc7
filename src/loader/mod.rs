// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level entry-point.
//!
//! The [`SurrogateLoader`] consumes configuration, builds the backend
//! registry, initializes logging and returns a [`Surrogate`] engine that
//! hands out cached proxy classes.


use once_cell::sync::Lazy;
use std::sync::Arc;
use thiserror::Error;

use crate::backend::{Backend, BackendRegistry};
use crate::cache::{LoadingContext, ProxyTypeCache, ProxyTypeKey};
use crate::config::{Config, ConfigError, ConfigProvider, EnvConfigProvider, FileConfigProvider, ProxyConfig};
use crate::core::{ProxyError, TargetType};
use crate::logging::config::LoggingConfig;
use crate::logging::{self, log_error};
use crate::proxy::ProxyClass;
use crate::rules::{RuleConfig, RuleSet};
use crate::{debug_fmt, info_fmt, warn_fmt};

/// Errors that can occur while assembling an engine.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Proxy error
    #[error("proxy error: {0}")]
    ProxyError(#[from] ProxyError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Builder for a [`Surrogate`] engine.
#[derive(Debug, Default)]
pub struct SurrogateLoader {
    config: Option<Config>,
    config_file_path: Option<String>,
    use_env_vars: bool,
    env_prefix: Option<String>,
    providers: Vec<Arc<dyn ConfigProvider>>,
    custom_backends: Vec<Arc<dyn Backend>>,
    context: Option<LoadingContext>,
}

impl SurrogateLoader {
    /// Create a new loader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a ready-made configuration. File, env and provider settings are
    /// ignored when one is given.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a configuration file to load.
    pub fn with_config_file(mut self, file_path: &str) -> Self {
        self.config_file_path = Some(file_path.to_string());
        self
    }

    /// Enable environment variable configuration.
    pub fn with_env_vars(mut self) -> Self {
        self.use_env_vars = true;
        self
    }

    /// Set a custom prefix for environment variables (default is "SURROGATE_").
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.use_env_vars = true;
        self
    }

    /// Add a configuration provider; it overrides file and env values.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Append a backend after the configured ones.
    pub fn with_backend<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.custom_backends.push(Arc::new(backend));
        self
    }

    /// Loading context used when callers do not pass one.
    pub fn with_context(mut self, context: LoadingContext) -> Self {
        self.context = Some(context);
        self
    }

    fn build_config(&mut self) -> Result<Config, LoaderError> {
        if let Some(config) = self.config.take() {
            return Ok(config);
        }

        let mut builder = Config::builder();

        if let Some(file_path) = &self.config_file_path {
            builder = builder.with_provider(FileConfigProvider::new(file_path)?);
        }

        if self.use_env_vars {
            let env_provider = match &self.env_prefix {
                Some(prefix) => EnvConfigProvider::new(prefix),
                None => EnvConfigProvider::default(),
            };
            builder = builder.with_provider(env_provider);
        }

        for provider in self.providers.drain(..) {
            builder = builder.with_shared_provider(provider);
        }
        Ok(builder.build())
    }

    /// Build the engine.
    pub fn build(mut self) -> Result<Surrogate, LoaderError> {
        let config = Arc::new(self.build_config()?);

        match config.get::<LoggingConfig>("proxy.logging") {
            Ok(Some(logging_config)) => {
                logging::init_with_config(logging_config.level_filter(), &logging_config);
            }
            Ok(None) => {
                logging::init(None);
                debug_fmt!("Startup", "Logging configuration not found, using defaults");
            }
            Err(e) => {
                log_error("Startup", format!("Failed to read logging configuration: {e}"));
            }
        }

        let backends: Vec<String> = config.get_or_default("proxy.backends", ProxyConfig::default().backends)?;
        let mut registry = BackendRegistry::from_names(&backends)?;
        for backend in self.custom_backends {
            registry.register(backend);
        }
        if registry.is_empty() {
            return Err(log_error(
                "Startup",
                LoaderError::Other("no proxy backends configured".to_string()),
            ));
        }

        let rule_configs: Vec<RuleConfig> = config.get_or_default("proxy.rules", Vec::new())?;
        let config_rules = RuleSet::from_configs(&rule_configs)?;

        let context = self.context.unwrap_or_else(LoadingContext::current);

        info_fmt!(
            "Startup",
            "Surrogate ready: backends [{}], {} configured rule(s), context '{}'",
            registry.names().join(", "),
            config_rules.len(),
            context
        );

        Ok(Surrogate::new(config, registry, config_rules, context))
    }
}

static GLOBAL: Lazy<Surrogate> = Lazy::new(|| {
    Surrogate::new(
        Arc::new(Config::empty()),
        BackendRegistry::with_defaults(),
        RuleSet::empty(),
        LoadingContext::current(),
    )
});

/// A proxy engine: backends, the proxy type cache and configuration.
#[derive(Debug)]
pub struct Surrogate {
    config: Arc<Config>,
    registry: BackendRegistry,
    cache: ProxyTypeCache,
    config_rules: RuleSet,
    context: LoadingContext,
}

impl Surrogate {
    fn new(config: Arc<Config>, registry: BackendRegistry, config_rules: RuleSet, context: LoadingContext) -> Self {
        Self {
            config,
            registry,
            cache: ProxyTypeCache::new(),
            config_rules,
            context,
        }
    }

    /// Create a new loader for building an engine.
    pub fn loader() -> SurrogateLoader {
        SurrogateLoader::new()
    }

    /// The process-wide engine with default backends and an empty
    /// configuration. It does not initialize logging.
    pub fn global() -> &'static Surrogate {
        &GLOBAL
    }

    /// Proxy `target` in the engine's default context, letting the
    /// registry pick the backend.
    pub fn proxy_class(&self, target: &TargetType, rules: &RuleSet) -> Result<ProxyClass, ProxyError> {
        self.proxy_class_with(target, rules, &self.context, None)
    }

    /// Proxy `target` with the rules from `proxy.rules`.
    pub fn proxy_class_from_config(&self, target: &TargetType) -> Result<ProxyClass, ProxyError> {
        self.proxy_class_with(target, &self.config_rules, &self.context, None)
    }

    /// Proxy `target`, optionally pinning a backend by name.
    ///
    /// Identical (target, rules, backend, context) requests share one
    /// generated type; failures are not cached.
    pub fn proxy_class_with(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
        backend: Option<&str>,
    ) -> Result<ProxyClass, ProxyError> {
        let backend = self.registry.resolve(target, backend).map_err(|e| {
            warn_fmt!("Surrogate", "no backend for {}: {}", target, e);
            e
        })?;

        let key = ProxyTypeKey::new(target, rules, backend.name(), context);
        let proxy_type = self
            .cache
            .get_or_create(&key, || {
                info_fmt!(
                    "Surrogate",
                    "Generating proxy for {} with backend '{}' ({} rule(s))",
                    target,
                    backend.name(),
                    rules.len()
                );
                backend.generate(target, rules, context)
            })
            .map_err(|e| {
                warn_fmt!("Surrogate", "Proxy generation for {} failed: {}", target, e);
                e
            })?;

        Ok(ProxyClass::new(proxy_type))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ProxyTypeCache {
        &self.cache
    }

    /// Rules read from `proxy.rules` at build time.
    pub fn config_rules(&self) -> &RuleSet {
        &self.config_rules
    }

    pub fn context(&self) -> &LoadingContext {
        &self.context
    }
}
