// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared fixtures for the integration tests.

use serde_json::{Value, json};
use std::sync::Arc;
use surrogate::{
    MethodDescriptor, NameMatcher, ProxyError, Rule, RuleSet, SignatureMatcher, Surrogate, TargetType,
    TypeBuilder, ValueType,
};

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

/// Concrete class `TC` with `hello(string, string) -> string`.
#[allow(dead_code)]
pub fn tc() -> TargetType {
    TypeBuilder::class("TC")
        .method(
            MethodDescriptor::new("hello", vec![ValueType::String, ValueType::String], ValueType::String)
                .with_body(|_, args| Ok(json!(format!("hello: a = {}, b = {}", text(&args[0]), text(&args[1]))))),
        )
        .build()
}

/// Interface `TI` declaring `hello(string, string) -> string` without a body.
#[allow(dead_code)]
pub fn ti() -> TargetType {
    TypeBuilder::interface("TI")
        .method(MethodDescriptor::new(
            "hello",
            vec![ValueType::String, ValueType::String],
            ValueType::String,
        ))
        .build()
}

/// Matches `hello(string, string)`.
pub fn hello_matcher() -> Arc<SignatureMatcher> {
    Arc::new(SignatureMatcher::of("hello", vec![ValueType::String, ValueType::String]))
}

/// Prefixes the original result with `proxy-> `.
#[allow(dead_code)]
pub fn prefix_rule() -> Rule {
    Rule::from_fn(hello_matcher(), |_, _, super_invoke, args| {
        let original = super_invoke.invoke(args)?;
        Ok(json!(format!("proxy-> {}", text(&original))))
    })
}

/// Answers `proxy-> interface` without calling super.
#[allow(dead_code)]
pub fn interface_rule() -> Rule {
    Rule::from_fn(hello_matcher(), |_, _, _, _| Ok(json!("proxy-> interface")))
}

/// A rule on `name` that returns a fixed string.
#[allow(dead_code)]
pub fn constant_rule(name: &str, answer: &'static str) -> Rule {
    Rule::from_fn(Arc::new(NameMatcher::of(name)), move |_, _, _, _| Ok(json!(answer)))
}

/// A rule on `name` that forwards to the original behavior untouched.
#[allow(dead_code)]
pub fn passthrough_rule(name: &str) -> Rule {
    Rule::from_fn(Arc::new(NameMatcher::of(name)), |_, _, super_invoke, args| {
        super_invoke.invoke(args)
    })
}

/// An engine isolated from the process-wide one.
#[allow(dead_code)]
pub fn engine() -> Surrogate {
    Surrogate::loader()
        .build()
        .unwrap_or_else(|e| panic!("failed to build engine: {e}"))
}

/// Generate with `rules` and call `hello("a", "b")` on a fresh instance.
#[allow(dead_code)]
pub fn call_hello(engine: &Surrogate, target: &TargetType, rules: &RuleSet) -> Result<Value, ProxyError> {
    let class = engine.proxy_class(target, rules)?;
    let instance = class.new_instance(&[])?;
    instance.invoke("hello", &[json!("a"), json!("b")])
}
