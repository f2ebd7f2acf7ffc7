// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;
use crate::core::{TypeBuilder, ValueType};
use crate::proxy::DispatchTable;
use serde_json::json;
use serial_test::serial;

fn method(name: &str, params: Vec<ValueType>, ret: ValueType) -> MethodDescriptor {
    MethodDescriptor::new(name, params, ret)
}

fn constant(value: Value) -> Arc<dyn Interceptor> {
    Arc::new(FnInterceptor::new("constant", move |_, _, _, _| Ok(value.clone())))
}

#[test]
fn test_name_matcher() {
    let matcher = NameMatcher::of("hello");
    assert!(matcher.matches(&method("hello", vec![], ValueType::Void)));
    assert!(matcher.matches(&method("hello", vec![ValueType::String], ValueType::Void)));
    assert!(!matcher.matches(&method("hello2", vec![], ValueType::Void)));
    assert_eq!(matcher.matcher_type(), "name");
}

#[test]
fn test_glob_and_regex_matchers() {
    let glob = GlobMatcher::new(GlobMatcherConfig {
        patterns: vec!["get*".to_string(), "is?".to_string()],
    })
    .unwrap();
    assert!(glob.matches(&method("getName", vec![], ValueType::String)));
    assert!(glob.matches(&method("isA", vec![], ValueType::Bool)));
    assert!(!glob.matches(&method("isOpen", vec![], ValueType::Bool)));
    assert!(!glob.matches(&method("setName", vec![ValueType::String], ValueType::Void)));

    let regex = RegexMatcher::new(RegexMatcherConfig {
        pattern: "^(get|set)[A-Z]".to_string(),
    })
    .unwrap();
    assert!(regex.matches(&method("setName", vec![ValueType::String], ValueType::Void)));
    assert!(!regex.matches(&method("settle", vec![], ValueType::Void)));

    let err = RegexMatcher::new(RegexMatcherConfig {
        pattern: "(".to_string(),
    })
    .unwrap_err();
    assert!(matches!(err, ProxyError::MatcherError(_)));
}

#[test]
fn test_signature_parameter_and_return_matchers() {
    let two_strings = method("hello", vec![ValueType::String, ValueType::String], ValueType::String);
    let one_string = method("hello", vec![ValueType::String], ValueType::String);

    let signature = SignatureMatcher::of("hello", vec![ValueType::String, ValueType::String]);
    assert!(signature.matches(&two_strings));
    assert!(!signature.matches(&one_string));

    let params = ParameterMatcher::new(ParameterMatcherConfig {
        params: vec![ValueType::String],
    });
    assert!(params.matches(&one_string));
    assert!(!params.matches(&two_strings));

    let returns = ReturnTypeMatcher::new(ReturnTypeMatcherConfig {
        returns: ValueType::String,
    });
    assert!(returns.matches(&one_string));
    assert!(!returns.matches(&method("close", vec![], ValueType::Void)));
}

#[test]
fn test_any_all_and_fn_matchers() {
    let getter = method("getName", vec![], ValueType::String);
    let setter = method("setName", vec![ValueType::String], ValueType::Void);

    assert!(AnyMatcher.matches(&getter));

    let all = AllMatcher::new(vec![
        Arc::new(FnMatcher::new("starts-with-get", |m| m.name().starts_with("get"))),
        Arc::new(ReturnTypeMatcher::new(ReturnTypeMatcherConfig {
            returns: ValueType::String,
        })),
    ]);
    assert!(all.matches(&getter));
    assert!(!all.matches(&setter));
    assert_eq!(all.matcher_type(), "all");
}

#[test]
fn test_matcher_factory_builtins() {
    let name = MatcherFactory::create_matcher("name", json!({ "names": ["run"] })).unwrap();
    assert_eq!(name.matcher_type(), "name");
    assert!(name.matches(&method("run", vec![], ValueType::Void)));

    let any = MatcherFactory::create_matcher("any", Value::Null).unwrap();
    assert_eq!(any.matcher_type(), "any");

    let all = MatcherFactory::create_matcher(
        "all",
        json!({ "matchers": [
            { "type": "glob", "config": { "patterns": ["get*"] } },
            { "type": "parameters", "config": { "params": [] } }
        ] }),
    )
    .unwrap();
    assert!(all.matches(&method("getId", vec![], ValueType::Int)));
    assert!(!all.matches(&method("getById", vec![ValueType::Int], ValueType::Object)));

    let signature =
        MatcherFactory::create_matcher("signature", json!({ "name": "hello", "params": ["string"] })).unwrap();
    assert!(signature.matches(&method("hello", vec![ValueType::String], ValueType::String)));
}

#[test]
fn test_matcher_factory_errors() {
    assert!(matches!(
        MatcherFactory::create_matcher("telepathy", Value::Null),
        Err(ProxyError::MatcherError(_))
    ));
    assert!(matches!(
        MatcherFactory::create_matcher("name", json!({ "names": "not-a-list" })),
        Err(ProxyError::MatcherError(_))
    ));
    assert!(matches!(
        MatcherFactory::create_matcher("glob", json!({ "patterns": ["["] })),
        Err(ProxyError::MatcherError(_))
    ));
}

fn prefix_matcher(config: Value) -> Result<Arc<dyn MethodMatcher>, ProxyError> {
    let prefix = config
        .get("prefix")
        .and_then(Value::as_str)
        .ok_or_else(|| ProxyError::MatcherError("prefix required".to_string()))?
        .to_string();
    Ok(Arc::new(FnMatcher::new("prefix", move |m| m.name().starts_with(&prefix))))
}

fn answer_interceptor(_config: Value) -> Result<Arc<dyn Interceptor>, ProxyError> {
    Ok(constant(json!(42)))
}

#[test]
#[serial]
fn test_registered_matcher_and_interceptor() {
    register_matcher("test-prefix", prefix_matcher);
    register_interceptor("test-answer", answer_interceptor);

    let matcher = MatcherFactory::create_matcher("test-prefix", json!({ "prefix": "compute" })).unwrap();
    assert!(matcher.matches(&method("computeAll", vec![], ValueType::Int)));
    assert!(MatcherFactory::create_matcher("test-prefix", Value::Null).is_err());

    let interceptor = InterceptorFactory::create_interceptor("test-answer", Value::Null).unwrap();
    assert_eq!(interceptor.name(), "constant");
}

#[test]
fn test_interceptor_factory() {
    let logging = InterceptorFactory::create_interceptor("logging", Value::Null).unwrap();
    assert_eq!(logging.name(), "logging");

    let logging =
        InterceptorFactory::create_interceptor("logging", json!({ "log_level": "debug", "log_result": true }))
            .unwrap();
    assert_eq!(logging.name(), "logging");

    assert!(matches!(
        InterceptorFactory::create_interceptor("logging", json!({ "log_result": "yes" })),
        Err(ProxyError::UnsupportedRule(_))
    ));
    assert!(matches!(
        InterceptorFactory::create_interceptor("teleport", Value::Null),
        Err(ProxyError::UnsupportedRule(_))
    ));
}

#[test]
fn test_first_matching_rule_wins() {
    let rules = RuleSet::new(vec![
        Rule::new(Arc::new(NameMatcher::of("hello")), constant(json!("first"))),
        Rule::new(Arc::new(AnyMatcher), constant(json!("second"))),
        Rule::new(Arc::new(NameMatcher::of("hello")), constant(json!("third"))),
    ]);

    assert_eq!(rules.bind(&method("hello", vec![], ValueType::String)), Some(0));
    assert_eq!(rules.bind(&method("other", vec![], ValueType::String)), Some(1));
    assert_eq!(RuleSet::empty().bind(&method("hello", vec![], ValueType::String)), None);

    let narrow = RuleSet::new(vec![Rule::new(Arc::new(NameMatcher::of("hello")), constant(Value::Null))]);
    assert_eq!(narrow.bind(&method("bye", vec![], ValueType::Void)), None);
}

#[test]
fn test_rule_identity() {
    let rule = Rule::new(Arc::new(AnyMatcher), constant(Value::Null));
    let clone = rule.clone();
    let other = Rule::new(Arc::new(AnyMatcher), constant(Value::Null));
    assert_eq!(rule.id(), clone.id());
    assert_ne!(rule.id(), other.id());

    let set = RuleSet::new(vec![rule.clone(), other.clone()]);
    assert_eq!(set.fingerprint(), vec![rule.id(), other.id()]);
    assert_eq!(set.clone().fingerprint(), set.fingerprint());

    // Order is part of the identity
    let reversed = RuleSet::new(vec![other, rule]);
    assert_ne!(set.fingerprint(), reversed.fingerprint());
    assert_eq!(set.len(), 2);
    assert!(!set.is_empty());
    assert_eq!(set.iter().count(), 2);
}

#[test]
fn test_rule_set_from_configs() {
    let configs: Vec<RuleConfig> = serde_json::from_value(json!([
        { "matcher": { "type": "name", "config": { "names": ["hello"] } },
          "interceptor": { "type": "logging" } },
        { "matcher": { "type": "any" },
          "interceptor": { "type": "logging", "config": { "log_arguments": false } } }
    ]))
    .unwrap();

    let rules = RuleSet::from_configs(&configs).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules.get(0).unwrap().matcher().matcher_type(), "name");
    assert_eq!(rules.get(1).unwrap().interceptor().name(), "logging");
    assert!(rules.get(2).is_none());
}

#[test]
fn test_logging_interceptor_forwards_to_super() {
    let target = TypeBuilder::class("Echo")
        .method(
            MethodDescriptor::new("echo", vec![ValueType::String], ValueType::String)
                .with_body(|_, args| Ok(args[0].clone())),
        )
        .build();
    let table = Arc::new(DispatchTable::plain(&target));
    let instance = Instance::new(table.clone(), false);
    let echo = table.slots()[0].method().clone();

    let interceptor = LoggingInterceptor::new(LoggingInterceptorConfig {
        log_result: true,
        ..LoggingInterceptorConfig::default()
    });
    let super_invoke = SuperInvoke::new(&instance, &echo);
    let result = interceptor
        .intercept(&instance, &echo, &super_invoke, &[json!("ping")])
        .unwrap();
    assert_eq!(result, json!("ping"));
}
