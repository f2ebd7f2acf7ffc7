// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests: generate proxy types and call through them.

use serde_json::json;
use serial_test::serial;
use surrogate::config::MemoryConfigProvider;
use surrogate::{LoadingContext, ProxyClass, ProxyError, RuleSet, Surrogate, TypeBuilder, ValueType};

mod common;
use common::{
    call_hello, constant_rule, engine, interface_rule, passthrough_rule, prefix_rule, tc, ti,
};

#[test]
#[serial]
fn test_concrete_target_prefixes_super_result() {
    let engine = engine();
    let rules = RuleSet::new(vec![prefix_rule()]);

    let result = call_hello(&engine, &tc(), &rules).unwrap();
    assert_eq!(result, json!("proxy-> hello: a = a, b = b"));
}

#[test]
#[serial]
fn test_interface_target_answers_without_super() {
    let engine = engine();
    let rules = RuleSet::new(vec![interface_rule()]);

    let class = engine.proxy_class(&ti(), &rules).unwrap();
    assert_eq!(class.backend_used(), "intercepting");
    let instance = class.new_instance(&[]).unwrap();
    assert_eq!(
        instance.invoke("hello", &[json!("a"), json!("b")]).unwrap(),
        json!("proxy-> interface")
    );
}

#[test]
#[serial]
fn test_interface_super_always_fails() {
    let engine = engine();
    let rules = RuleSet::new(vec![prefix_rule()]);
    let instance = engine
        .proxy_class(&ti(), &rules)
        .unwrap()
        .new_instance(&[])
        .unwrap();

    for i in 0..100 {
        match instance.invoke("hello", &[json!(i.to_string()), json!("b")]) {
            Err(ProxyError::NoSuperBehavior { type_name, method }) => {
                assert_eq!(type_name, "TI");
                assert_eq!(method, "hello(string, string)");
            }
            other => panic!("call {i} should have no super behavior, got {other:?}"),
        }
    }
}

#[test]
#[serial]
fn test_first_matching_rule_is_bound() {
    let engine = engine();
    let target = tc();

    let a_first = RuleSet::new(vec![constant_rule("hello", "A"), constant_rule("hello", "B")]);
    let b_first = RuleSet::new(vec![constant_rule("hello", "B"), constant_rule("hello", "A")]);

    assert_eq!(call_hello(&engine, &target, &a_first).unwrap(), json!("A"));
    assert_eq!(call_hello(&engine, &target, &b_first).unwrap(), json!("B"));
    // Different orderings are different keys
    assert_eq!(engine.cache().len(), 2);
}

#[test]
#[serial]
fn test_passthrough_matches_plain_instance() {
    let engine = engine();
    let target = tc();
    let rules = RuleSet::new(vec![passthrough_rule("hello")]);

    let plain = target.new_instance(&[]).unwrap();
    assert!(!plain.is_proxy());
    let proxy = engine
        .proxy_class(&target, &rules)
        .unwrap()
        .new_instance(&[])
        .unwrap();

    for (a, b) in [("a", "b"), ("", "x"), ("long value", "ü")] {
        let args = [json!(a), json!(b)];
        assert_eq!(proxy.invoke("hello", &args).unwrap(), plain.invoke("hello", &args).unwrap());
    }
}

#[test]
#[serial]
fn test_final_type_rejected_without_cache_entry() {
    let engine = engine();
    let locked = TypeBuilder::class("Locked").mark_final().build();
    let rules = RuleSet::new(vec![prefix_rule()]);

    for backend in [Some("subclass"), Some("intercepting"), None] {
        let err = engine
            .proxy_class_with(&locked, &rules, &LoadingContext::current(), backend)
            .unwrap_err();
        assert!(
            matches!(err, ProxyError::UnsupportedTargetKind { .. }),
            "{backend:?}: {err:?}"
        );
    }
    assert!(engine.cache().is_empty());
    assert_eq!(engine.cache().entry_count(), 0);
}

#[test]
#[serial]
fn test_retry_with_other_backend_after_rejection() {
    let engine = engine();
    let target = ti();
    let rules = RuleSet::new(vec![interface_rule()]);
    let context = LoadingContext::current();

    assert!(matches!(
        engine.proxy_class_with(&target, &rules, &context, Some("subclass")),
        Err(ProxyError::UnsupportedTargetKind { .. })
    ));
    let class = engine
        .proxy_class_with(&target, &rules, &context, Some("interface"))
        .unwrap();
    assert_eq!(class.backend_used(), "interface");
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(engine.cache().entry_count(), 1);
}

#[test]
#[serial]
fn test_handler_result_type_is_checked() {
    let engine = engine();
    let target = tc();
    let rules = RuleSet::new(vec![surrogate::Rule::from_fn(common::hello_matcher(), |_, _, _, _| {
        Ok(json!(42))
    })]);

    let instance = engine
        .proxy_class(&target, &rules)
        .unwrap()
        .new_instance(&[])
        .unwrap();
    match instance.invoke("hello", &[json!("a"), json!("b")]) {
        Err(ProxyError::InterceptionTypeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, ValueType::String);
            assert_eq!(actual, ValueType::Int);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // The cached type stays usable for well-typed rules
    let good = RuleSet::new(vec![prefix_rule()]);
    assert_eq!(
        call_hello(&engine, &target, &good).unwrap(),
        json!("proxy-> hello: a = a, b = b")
    );
}

#[test]
#[serial]
fn test_loading_contexts_do_not_share_types() {
    let engine = engine();
    let target = tc();
    let rules = RuleSet::new(vec![prefix_rule()]);

    let first = engine
        .proxy_class_with(&target, &rules, &LoadingContext::new("plugin-a"), None)
        .unwrap();
    let again = engine
        .proxy_class_with(&target, &rules, &LoadingContext::new("plugin-a"), None)
        .unwrap();
    let default = engine.proxy_class(&target, &rules).unwrap();

    assert_ne!(first.name(), again.name());
    assert_ne!(first.name(), default.name());
    assert_eq!(engine.cache().len(), 3);
}

#[test]
#[serial]
fn test_global_engine() {
    let target = tc();
    let rules = RuleSet::new(vec![prefix_rule()]);
    let context = LoadingContext::current();

    let first = ProxyClass::new_proxy_class(&target, &rules, &context, None).unwrap();
    let second = ProxyClass::new_proxy_class(&target, &rules, &context, None).unwrap();
    assert!(std::sync::Arc::ptr_eq(first.proxy_type(), second.proxy_type()));
    assert!(Surrogate::global().cache().contains(&surrogate::ProxyTypeKey::new(
        &target,
        &rules,
        first.backend_used(),
        &context
    )));

    let instance = first.new_instance(&[]).unwrap();
    assert_eq!(
        instance.invoke("hello", &[json!("a"), json!("b")]).unwrap(),
        json!("proxy-> hello: a = a, b = b")
    );
}

#[test]
#[serial]
fn test_rules_from_configuration() {
    let provider = MemoryConfigProvider::from_value(json!({
        "proxy": {
            "backends": ["subclass", "interface"],
            "rules": [
                {
                    "matcher": { "type": "signature", "config": { "name": "hello", "params": ["string", "string"] } },
                    "interceptor": { "type": "logging", "config": { "log_result": true } }
                }
            ]
        }
    }))
    .unwrap();
    let engine = Surrogate::loader().with_provider(provider).build().unwrap();
    assert_eq!(engine.registry().names(), vec!["subclass", "interface"]);
    assert_eq!(engine.config_rules().len(), 1);

    let target = tc();
    let class = engine.proxy_class_from_config(&target).unwrap();
    assert_eq!(class.backend_used(), "subclass");
    let instance = class.new_instance(&[]).unwrap();
    assert_eq!(
        instance.invoke("hello", &[json!("a"), json!("b")]).unwrap(),
        json!("hello: a = a, b = b")
    );

    // Configured rules are built once, so repeated requests share a key
    let again = engine.proxy_class_from_config(&target).unwrap();
    assert!(std::sync::Arc::ptr_eq(class.proxy_type(), again.proxy_type()));
}
