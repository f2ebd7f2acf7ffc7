// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surrogate - runtime proxy generation for a dynamic type model
//!
//! Surrogate synthesizes new types at run time that extend a class or
//! implement an interface, routing selected method calls through
//! user-supplied interceptors.  An interceptor receives the instance, the
//! method, a handle that runs the original behavior, and the arguments.
//!
//! # Core Principles
//!
//! - **Explicit metamodel**: targets are described with [`TypeBuilder`];
//!   there is no reflection over host types
//! - **First match wins**: each method binds to the first matching rule, once,
//!   at generation time
//! - **Pluggable backends**: `intercepting`, `subclass` and `interface`, picked
//!   from a priority list or pinned by name
//! - **Generate once**: identical requests share one cached proxy type, even
//!   under concurrency
//!
//! # Configuration System
//!
//! Engines are assembled by [`SurrogateLoader`] from layered configuration:
//! files (JSON, TOML, YAML), environment variables and in-memory providers.
//! The `proxy` key carries the backend priority list, logging settings and
//! rules declared as data.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use surrogate::{MethodDescriptor, NameMatcher, Rule, RuleSet, Surrogate, TypeBuilder, ValueType};
//!
//! let greeter = TypeBuilder::class("Greeter")
//!     .method(
//!         MethodDescriptor::new("hello", vec![ValueType::String], ValueType::String)
//!             .with_body(|_, args| Ok(json!(format!("hello, {}", args[0])))),
//!     )
//!     .build();
//!
//! let rules = RuleSet::new(vec![Rule::from_fn(
//!     Arc::new(NameMatcher::of("hello")),
//!     |_, _, super_invoke, args| {
//!         let original = super_invoke.invoke(args)?;
//!         Ok(json!(format!("proxy-> {}", original.as_str().unwrap_or_default())))
//!     },
//! )]);
//!
//! let surrogate = Surrogate::loader().build()?;
//! let class = surrogate.proxy_class(&greeter, &rules)?;
//! let instance = class.new_instance(&[])?;
//! println!("{}", instance.invoke("hello", &[json!("world")])?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Module declarations
pub mod backend;
pub mod cache;
pub mod config;
pub mod core;
pub mod loader;
pub mod logging;
pub mod proxy;
pub mod reflect;
pub mod rules;

// Re-export key types at the crate root for convenience
pub use backend::{Backend, BackendFactory, BackendRegistry, Capabilities, register_backend};
pub use cache::{LoadingContext, ProxyTypeCache, ProxyTypeKey};
pub use config::{Config, ConfigError, ConfigProvider, ConfigProviderExt};
pub use core::{
    ConstructorDescriptor, MethodDescriptor, MethodSignature, ProxyError, TargetType, TypeBuilder,
    TypeKind, Value, ValueType, Visibility,
};
pub use loader::{LoaderError, Surrogate, SurrogateLoader};
pub use proxy::{Instance, ProxyClass, ProxyType, SuperInvoke};
pub use rules::{
    AnyMatcher, Interceptor, MatcherFactory, MethodMatcher, NameMatcher, Rule, RuleId, RuleSet,
    SignatureMatcher, register_interceptor, register_matcher,
};
