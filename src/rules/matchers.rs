// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Matcher implementations for rule binding.

use std::fmt;
use std::sync::Arc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{MatcherConfig, MethodMatcher};
use crate::core::{MethodDescriptor, ProxyError, ValueType};

/// Configuration for a name matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameMatcherConfig {
    /// Exact method names to match
    pub names: Vec<String>,
}

/// A matcher on exact method names, any overload.
#[derive(Debug)]
pub struct NameMatcher {
    config: NameMatcherConfig,
}

impl NameMatcher {
    pub fn new(config: NameMatcherConfig) -> Self {
        Self { config }
    }

    pub fn of(name: &str) -> Self {
        Self::new(NameMatcherConfig {
            names: vec![name.to_string()],
        })
    }
}

impl MethodMatcher for NameMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        self.config.names.iter().any(|n| n == method.name())
    }

    fn matcher_type(&self) -> &str {
        "name"
    }
}

/// Configuration for a glob matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobMatcherConfig {
    /// Glob patterns over method names, e.g. `get*`
    pub patterns: Vec<String>,
}

/// A matcher on method names using glob patterns.
#[derive(Debug)]
pub struct GlobMatcher {
    set: GlobSet,
}

impl GlobMatcher {
    pub fn new(config: GlobMatcherConfig) -> Result<Self, ProxyError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self { set: builder.build()? })
    }
}

impl MethodMatcher for GlobMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        self.set.is_match(method.name())
    }

    fn matcher_type(&self) -> &str {
        "glob"
    }
}

/// Configuration for a regex matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexMatcherConfig {
    /// Regular expression searched in the method name
    pub pattern: String,
}

/// A matcher on method names using a regular expression.
#[derive(Debug)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(config: RegexMatcherConfig) -> Result<Self, ProxyError> {
        let regex = Regex::new(&config.pattern).map_err(|e| {
            ProxyError::MatcherError(format!("Invalid method pattern '{}': {}", config.pattern, e))
        })?;
        Ok(Self { regex })
    }
}

impl MethodMatcher for RegexMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        self.regex.is_match(method.name())
    }

    fn matcher_type(&self) -> &str {
        "regex"
    }
}

/// Configuration for a signature matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureMatcherConfig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ValueType>,
}

/// A matcher on name plus exact parameter types.
#[derive(Debug)]
pub struct SignatureMatcher {
    config: SignatureMatcherConfig,
}

impl SignatureMatcher {
    pub fn new(config: SignatureMatcherConfig) -> Self {
        Self { config }
    }

    pub fn of(name: &str, params: Vec<ValueType>) -> Self {
        Self::new(SignatureMatcherConfig {
            name: name.to_string(),
            params,
        })
    }
}

impl MethodMatcher for SignatureMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        method.name() == self.config.name && method.params() == self.config.params.as_slice()
    }

    fn matcher_type(&self) -> &str {
        "signature"
    }
}

/// Configuration for a parameter matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterMatcherConfig {
    pub params: Vec<ValueType>,
}

/// A matcher on exact parameter types, any name.
#[derive(Debug)]
pub struct ParameterMatcher {
    config: ParameterMatcherConfig,
}

impl ParameterMatcher {
    pub fn new(config: ParameterMatcherConfig) -> Self {
        Self { config }
    }
}

impl MethodMatcher for ParameterMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        method.params() == self.config.params.as_slice()
    }

    fn matcher_type(&self) -> &str {
        "parameters"
    }
}

/// Configuration for a return type matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnTypeMatcherConfig {
    pub returns: ValueType,
}

/// A matcher on the declared return type.
#[derive(Debug)]
pub struct ReturnTypeMatcher {
    config: ReturnTypeMatcherConfig,
}

impl ReturnTypeMatcher {
    pub fn new(config: ReturnTypeMatcherConfig) -> Self {
        Self { config }
    }
}

impl MethodMatcher for ReturnTypeMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        method.return_type == self.config.returns
    }

    fn matcher_type(&self) -> &str {
        "returns"
    }
}

/// Matches every method.
#[derive(Debug)]
pub struct AnyMatcher;

impl MethodMatcher for AnyMatcher {
    fn matches(&self, _method: &MethodDescriptor) -> bool {
        true
    }

    fn matcher_type(&self) -> &str {
        "any"
    }
}

/// Configuration for a conjunction of matchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllMatcherConfig {
    pub matchers: Vec<MatcherConfig>,
}

/// Matches when every nested matcher matches.
#[derive(Debug)]
pub struct AllMatcher {
    matchers: Vec<Arc<dyn MethodMatcher>>,
}

impl AllMatcher {
    pub fn new(matchers: Vec<Arc<dyn MethodMatcher>>) -> Self {
        Self { matchers }
    }
}

impl MethodMatcher for AllMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        self.matchers.iter().all(|m| m.matches(method))
    }

    fn matcher_type(&self) -> &str {
        "all"
    }
}

/// A matcher backed by a closure.
pub struct FnMatcher {
    name: String,
    predicate: Box<dyn Fn(&MethodDescriptor) -> bool + Send + Sync>,
}

impl FnMatcher {
    pub fn new<F>(name: &str, predicate: F) -> Self
    where
        F: Fn(&MethodDescriptor) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for FnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMatcher").field("name", &self.name).finish()
    }
}

impl MethodMatcher for FnMatcher {
    fn matches(&self, method: &MethodDescriptor) -> bool {
        (self.predicate)(method)
    }

    fn matcher_type(&self) -> &str {
        &self.name
    }
}
