// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors surfaced through the public API.

use serde_json::{Value, json};
use serial_test::serial;
use std::error::Error;
use surrogate::config::MemoryConfigProvider;
use surrogate::{
    ConfigError, ConfigProvider, ConstructorDescriptor, LoaderError, MethodDescriptor, ProxyError, RuleSet,
    Surrogate, TypeBuilder, ValueType,
};

mod common;
use common::{engine, passthrough_rule, prefix_rule, tc};

#[derive(Debug)]
struct FailingConfigProvider;

impl ConfigProvider for FailingConfigProvider {
    fn has(&self, _key: &str) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "failing-provider"
    }

    fn get_raw(&self, _key: &str) -> Result<Option<Value>, ConfigError> {
        Err(ConfigError::ParseError("Simulated config error".to_string()))
    }
}

#[test]
#[serial]
fn test_failing_provider_fails_build() {
    let err = Surrogate::loader()
        .with_provider(FailingConfigProvider)
        .build()
        .unwrap_err();
    assert!(matches!(err, LoaderError::ConfigError(ConfigError::ParseError(_))));
}

#[test]
#[serial]
fn test_unknown_backend_in_config() {
    let provider = MemoryConfigProvider::new().set("proxy.backends", json!(["subclass", "bytecode"]));
    let err = Surrogate::loader().with_provider(provider).build().unwrap_err();
    match err {
        LoaderError::ProxyError(ProxyError::UnknownBackend(name)) => assert_eq!(name, "bytecode"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
#[serial]
fn test_invalid_rule_in_config() {
    let provider = MemoryConfigProvider::new().set(
        "proxy.rules",
        json!([{ "matcher": { "type": "regex", "config": { "pattern": "(" } },
                 "interceptor": { "type": "logging" } }]),
    );
    let err = Surrogate::loader().with_provider(provider).build().unwrap_err();
    assert!(matches!(err, LoaderError::ProxyError(ProxyError::MatcherError(_))));
}

#[test]
#[serial]
fn test_call_errors() {
    let engine = engine();
    let instance = engine
        .proxy_class(&tc(), &RuleSet::new(vec![prefix_rule()]))
        .unwrap()
        .new_instance(&[])
        .unwrap();

    assert!(matches!(
        instance.invoke("goodbye", &[]),
        Err(ProxyError::NoSuchMethod { .. })
    ));
    // Arguments are checked before the interceptor runs
    match instance.invoke("hello", &[json!("a"), json!(1)]) {
        Err(ProxyError::ArgumentMismatch { method, reason }) => {
            assert_eq!(method, "hello(string, string)");
            assert_eq!(reason, "argument 1 is int, expected string");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
#[serial]
fn test_construction_errors() {
    let engine = engine();
    let target = TypeBuilder::class("Port")
        .constructor(
            ConstructorDescriptor::new(vec![ValueType::Int]).with_init(|instance, args| {
                let port = args[0].as_i64().unwrap_or_default();
                if port <= 0 {
                    return Err(ProxyError::Other(format!("invalid port {port}")));
                }
                instance.set_field("port", port);
                Ok(())
            }),
        )
        .method(
            MethodDescriptor::new("port", vec![], ValueType::Int)
                .with_body(|instance, _| Ok(instance.get_field("port").unwrap_or(Value::Null))),
        )
        .build();
    let class = engine
        .proxy_class(&target, &RuleSet::new(vec![passthrough_rule("port")]))
        .unwrap();

    let instance = class.new_instance(&[json!(8080)]).unwrap();
    assert_eq!(instance.invoke("port", &[]).unwrap(), json!(8080));

    match class.new_instance(&[json!(-1)]) {
        Err(err @ ProxyError::ConstructionFailure { .. }) => {
            assert_eq!(err.source().map(|s| s.to_string()), Some("invalid port -1".to_string()));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        class.new_instance(&[json!("http")]),
        Err(ProxyError::ConstructionFailure { .. })
    ));
}

#[test]
#[serial]
fn test_codegen_failure_is_retryable() {
    let engine = engine();
    let broken = TypeBuilder::class("Broken")
        .method(MethodDescriptor::new("bad name", vec![], ValueType::Void).with_body(|_, _| Ok(Value::Null)))
        .build();
    let rules = RuleSet::empty();

    for _ in 0..2 {
        assert!(matches!(
            engine.proxy_class(&broken, &rules),
            Err(ProxyError::CodeGenerationFailure { .. })
        ));
    }
    assert!(engine.cache().is_empty());
    assert_eq!(engine.cache().entry_count(), 0);
}
