// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core primitives – values, type descriptors & the error taxonomy.
//!
//! Everything a generated proxy type is built from is defined in this
//! module.  No generation logic lives here; that sits in `backend` (emission)
//! and `proxy` (dispatch at call time).

mod types;


use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use types::{
    ConstructorBody, ConstructorDescriptor, MethodBody, MethodDescriptor, MethodSignature,
    TargetType, TypeBuilder, TypeKind, Visibility,
};

/// Dynamic argument / result value flowing through proxied calls.
pub type Value = serde_json::Value;

/// Errors that can occur while generating, instantiating or calling proxies.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The backend cannot proxy this kind of type
    #[error("backend '{backend}' cannot proxy '{type_name}': {reason}")]
    UnsupportedTargetKind {
        type_name: String,
        backend: String,
        reason: String,
    },

    /// A rule could not be represented by the backend
    #[error("unsupported rule: {0}")]
    UnsupportedRule(String),

    /// Emission-level failure while building a proxy type
    #[error("code generation failed for '{type_name}': {reason}")]
    CodeGenerationFailure { type_name: String, reason: String },

    /// An interceptor returned a value the method cannot return
    #[error("interceptor for '{method}' returned {actual}, expected {expected}")]
    InterceptionTypeMismatch {
        method: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// Super invocation requested where no original body exists
    #[error("no super behavior for '{type_name}::{method}'")]
    NoSuperBehavior { type_name: String, method: String },

    /// A proxy instance could not be constructed
    #[error("cannot construct '{type_name}': {reason}")]
    ConstructionFailure {
        type_name: String,
        reason: String,
        #[source]
        source: Option<Box<ProxyError>>,
    },

    /// Dynamic call to a method the type does not have
    #[error("no method '{method}' on '{type_name}'")]
    NoSuchMethod { type_name: String, method: String },

    /// Call arguments do not fit the method's parameters
    #[error("argument mismatch calling '{method}': {reason}")]
    ArgumentMismatch { method: String, reason: String },

    /// Backend name not present in the registry
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// Matcher construction error
    #[error("matcher error: {0}")]
    MatcherError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<crate::config::error::ConfigError> for ProxyError {
    fn from(err: crate::config::error::ConfigError) -> Self {
        ProxyError::ConfigError(err.to_string())
    }
}

impl From<globset::Error> for ProxyError {
    fn from(e: globset::Error) -> Self {
        ProxyError::MatcherError(e.to_string())
    }
}

impl From<regex::Error> for ProxyError {
    fn from(e: regex::Error) -> Self {
        ProxyError::MatcherError(e.to_string())
    }
}

impl ProxyError {
    /// Shorthand for a construction failure without an underlying cause.
    pub fn construction<N: fmt::Display, R: fmt::Display>(type_name: N, reason: R) -> Self {
        ProxyError::ConstructionFailure {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
            source: None,
        }
    }

    /// Shorthand for a code generation failure.
    pub fn codegen<N: fmt::Display, R: fmt::Display>(type_name: N, reason: R) -> Self {
        ProxyError::CodeGenerationFailure {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Declared type of a parameter or a return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Any,
    Void,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueType {
    /// Runtime assignability check of a value against this declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Void => value.is_null(),
            ValueType::Bool => value.is_boolean(),
            ValueType::Int => value.is_i64() || value.is_u64(),
            // Integers widen to floats
            ValueType::Float => value.is_number(),
            ValueType::String => value.is_string(),
            ValueType::Array => value.is_array(),
            ValueType::Object => value.is_object(),
        }
    }

    /// The narrowest declared type describing a value.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Void,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) if n.is_f64() => ValueType::Float,
            Value::Number(_) => ValueType::Int,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Returns true if every argument is accepted by the matching parameter type.
    pub fn accepts_all(params: &[ValueType], args: &[Value]) -> bool {
        params.len() == args.len()
            && params.iter().zip(args).all(|(param, arg)| param.accepts(arg))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Void => write!(f, "void"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::Array => write!(f, "array"),
            ValueType::Object => write!(f, "object"),
        }
    }
}
