// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interception rules – *matchers* & *interceptors*.
//!
//! A [`RuleSet`] owns an ordered vector of [`Rule`]s.  For every method of a
//! target type the first rule whose matcher returns `true` is bound; later
//! rules are never consulted for that method.  Binding happens once, when a
//! proxy type is generated.
//!
//! ### Built-in matchers
//! | type         | configuration                              |
//! |--------------|--------------------------------------------|
//! | `name`       | `{"names": ["hello"]}`                     |
//! | `glob`       | `{"patterns": ["get*"]}`                   |
//! | `regex`      | `{"pattern": "^(get|set)[A-Z]"}`           |
//! | `signature`  | `{"name": "hello", "params": ["string"]}`  |
//! | `parameters` | `{"params": ["string", "string"]}`         |
//! | `returns`    | `{"returns": "string"}`                    |
//! | `any`        | `{}`                                       |
//! | `all`        | `{"matchers": [{"type": …, "config": …}]}` |

mod interceptors;
mod matchers;

#[cfg(test)]
mod tests;

pub use interceptors::*;
pub use matchers::*;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{MethodDescriptor, ProxyError, Value};
use crate::proxy::{Instance, SuperInvoke};

/// Decides whether a method is intercepted. Must be pure.
pub trait MethodMatcher: Send + Sync + fmt::Debug {
    /// Check if the method is selected by this matcher.
    fn matches(&self, method: &MethodDescriptor) -> bool;

    /// Get the matcher type.
    fn matcher_type(&self) -> &str;
}

/// Handles every call to a method bound to its rule.
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Get the interceptor name.
    fn name(&self) -> &str;

    /// Handle a call. `super_invoke` runs the original behavior and may be
    /// called any number of times, including zero.
    fn intercept(
        &self,
        instance: &Instance,
        method: &MethodDescriptor,
        super_invoke: &SuperInvoke<'_>,
        args: &[Value],
    ) -> Result<Value, ProxyError>;
}

/// Stable identity of a rule, shared by its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(Uuid);

impl RuleId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A matcher paired with the interceptor it binds.
#[derive(Debug, Clone)]
pub struct Rule {
    id: RuleId,
    matcher: Arc<dyn MethodMatcher>,
    interceptor: Arc<dyn Interceptor>,
}

impl Rule {
    pub fn new(matcher: Arc<dyn MethodMatcher>, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            id: RuleId::new(),
            matcher,
            interceptor,
        }
    }

    /// Build a rule from a matcher and a closure handler.
    pub fn from_fn<F>(matcher: Arc<dyn MethodMatcher>, handler: F) -> Self
    where
        F: Fn(&Instance, &MethodDescriptor, &SuperInvoke<'_>, &[Value]) -> Result<Value, ProxyError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(matcher, Arc::new(FnInterceptor::new("fn", handler)))
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn matches(&self, method: &MethodDescriptor) -> bool {
        self.matcher.matches(method)
    }

    pub fn matcher(&self) -> &Arc<dyn MethodMatcher> {
        &self.matcher
    }

    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }
}

/// Ordered, immutable list of rules attached to a generation request.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Arc<[Rule]>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules: rules.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build rules declared in configuration.
    pub fn from_configs(configs: &[RuleConfig]) -> Result<Self, ProxyError> {
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            let matcher =
                MatcherFactory::create_matcher(&config.matcher.type_, config.matcher.config.clone())?;
            let interceptor = InterceptorFactory::create_interceptor(
                &config.interceptor.type_,
                config.interceptor.config.clone(),
            )?;
            rules.push(Rule::new(matcher, interceptor));
        }
        Ok(Self::new(rules))
    }

    /// Ordered rule identities; equal fingerprints mean the same rule set.
    pub fn fingerprint(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Index of the first rule matching `method`.
    pub fn bind(&self, method: &MethodDescriptor) -> Option<usize> {
        let bound = self.rules.iter().position(|rule| rule.matches(method));
        log::trace!(
            "Binding {}::{} -> {}",
            method.declaring_type,
            method.signature,
            bound.map_or_else(|| "none".to_string(), |idx| format!("rule #{idx}"))
        );
        bound
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

/// Configuration for a matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// The type of matcher
    #[serde(rename = "type")]
    pub type_: String,
    /// The configuration for the matcher
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Configuration for an interceptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorConfig {
    /// The type of interceptor
    #[serde(rename = "type")]
    pub type_: String,
    /// The configuration for the interceptor
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Configuration for a whole rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub matcher: MatcherConfig,
    pub interceptor: InterceptorConfig,
}

/// Constructor signature every dynamic matcher must implement
pub type MatcherConstructor = fn(serde_json::Value) -> Result<Arc<dyn MethodMatcher>, ProxyError>;

static MATCHER_REGISTRY: Lazy<RwLock<HashMap<String, MatcherConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a matcher under a unique name. Registered matchers shadow the
/// built-in ones of the same name.
pub fn register_matcher(name: &str, ctor: MatcherConstructor) {
    MATCHER_REGISTRY.write().insert(name.to_string(), ctor);
}

fn get_registered_matcher(name: &str) -> Option<MatcherConstructor> {
    MATCHER_REGISTRY.read().get(name).copied()
}

fn parse_config<T: serde::de::DeserializeOwned>(
    kind: &str,
    config: serde_json::Value,
) -> Result<T, ProxyError> {
    serde_json::from_value(config).map_err(|e| {
        let err = ProxyError::MatcherError(format!("Invalid {kind} matcher config: {e}"));
        log::error!("{err}");
        err
    })
}

/// Factory for creating matchers based on configuration.
#[derive(Debug)]
pub struct MatcherFactory;

impl MatcherFactory {
    /// Create a matcher based on the matcher type and configuration.
    pub fn create_matcher(
        matcher_type: &str,
        config: serde_json::Value,
    ) -> Result<Arc<dyn MethodMatcher>, ProxyError> {
        log::debug!("Creating matcher of type '{matcher_type}' with config: {config}");

        if let Some(ctor) = get_registered_matcher(matcher_type) {
            return ctor(config);
        }

        match matcher_type {
            "name" => Ok(Arc::new(NameMatcher::new(parse_config(matcher_type, config)?))),
            "glob" => Ok(Arc::new(GlobMatcher::new(parse_config(matcher_type, config)?)?)),
            "regex" => Ok(Arc::new(RegexMatcher::new(parse_config(matcher_type, config)?)?)),
            "signature" => Ok(Arc::new(SignatureMatcher::new(parse_config(matcher_type, config)?))),
            "parameters" => Ok(Arc::new(ParameterMatcher::new(parse_config(matcher_type, config)?))),
            "returns" => Ok(Arc::new(ReturnTypeMatcher::new(parse_config(matcher_type, config)?))),
            "any" => Ok(Arc::new(AnyMatcher)),
            "all" => {
                let all: AllMatcherConfig = parse_config(matcher_type, config)?;
                let matchers = all
                    .matchers
                    .into_iter()
                    .map(|m| Self::create_matcher(&m.type_, m.config))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(AllMatcher::new(matchers)))
            }
            _ => {
                let err = ProxyError::MatcherError(format!("Unknown matcher type: {matcher_type}"));
                log::error!("{err}");
                Err(err)
            }
        }
    }
}
