// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proxy type generation under concurrent demand.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use surrogate::{
    Backend, Capabilities, LoadingContext, ProxyError, ProxyType, RuleSet, Surrogate, TargetType,
    backend::SubclassBackend,
};

mod common;
use common::{engine, prefix_rule, tc};

const THREADS: usize = 32;

#[test]
fn test_concurrent_requests_share_one_type() {
    let engine = engine();
    let target = tc();
    let rules = RuleSet::new(vec![prefix_rule()]);
    let barrier = Barrier::new(THREADS);

    let types: Vec<Arc<ProxyType>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let class = engine.proxy_class(&target, &rules).unwrap();
                    let instance = class.new_instance(&[]).unwrap();
                    assert_eq!(
                        instance.invoke("hello", &[json!("a"), json!("b")]).unwrap(),
                        json!("proxy-> hello: a = a, b = b")
                    );
                    class.proxy_type().clone()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
    assert_eq!(engine.cache().len(), 1);
}

/// Counts generations and sleeps to widen the race window.
#[derive(Debug, Default)]
struct CountingBackend {
    generations: Arc<AtomicUsize>,
}

impl Backend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn capabilities(&self) -> Capabilities {
        SubclassBackend.capabilities()
    }

    fn generate(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
    ) -> Result<ProxyType, ProxyError> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(25));
        SubclassBackend.generate(target, rules, context)
    }
}

fn counting_engine() -> (Surrogate, Arc<AtomicUsize>) {
    let generations = Arc::new(AtomicUsize::new(0));
    let engine = Surrogate::loader()
        .with_backend(CountingBackend {
            generations: generations.clone(),
        })
        .build()
        .unwrap();
    (engine, generations)
}

#[test]
fn test_generation_runs_once_per_key() {
    let (engine, generations) = counting_engine();
    let target = tc();
    let rules = RuleSet::new(vec![prefix_rule()]);
    let context = LoadingContext::current();
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                barrier.wait();
                engine
                    .proxy_class_with(&target, &rules, &context, Some("counting"))
                    .unwrap();
            });
        }
    });

    assert_eq!(generations.load(Ordering::SeqCst), 1);
}

#[test]
fn test_distinct_keys_generate_independently() {
    let (engine, generations) = counting_engine();
    let targets: Vec<TargetType> = (0..8).map(|_| tc()).collect();
    let rules = RuleSet::new(vec![prefix_rule()]);
    let context = LoadingContext::current();

    thread::scope(|scope| {
        for target in &targets {
            for _ in 0..4 {
                let (engine, rules, context) = (&engine, &rules, &context);
                scope.spawn(move || {
                    engine
                        .proxy_class_with(target, rules, context, Some("counting"))
                        .unwrap();
                });
            }
        }
    });

    assert_eq!(generations.load(Ordering::SeqCst), targets.len());
    assert_eq!(engine.cache().len(), targets.len());
}
