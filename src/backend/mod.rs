// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Code generation backends
//!
//! A backend turns a target type and an ordered rule set into a
//! [`ProxyType`].  Three backends ship with the crate:
//!
//! | name           | targets               | unmatched abstract methods        |
//! |----------------|-----------------------|-----------------------------------|
//! | `intercepting` | classes + interfaces  | stay abstract (not instantiable)  |
//! | `subclass`     | classes               | stay abstract (not instantiable)  |
//! | `interface`    | interfaces            | stubbed, fail when called         |
//!
//! Backends are picked from a [`BackendRegistry`], an explicit priority
//! list.  The default order is `intercepting`, `subclass`, `interface`.

mod intercepting;
mod interface;
mod subclass;


pub use intercepting::InterceptingBackend;
pub use interface::InterfaceBackend;
pub use subclass::SubclassBackend;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cache::LoadingContext;
use crate::core::{
    ConstructorDescriptor, MethodDescriptor, MethodSignature, ProxyError, TargetType, TypeKind,
    ValueType,
};
use crate::proxy::{DispatchTable, ProxyType, Slot};
use crate::reflect;
use crate::rules::RuleSet;
use crate::{debug_fmt, warn_fmt};

/// Name of the subclass backend.
pub const SUBCLASS: &str = "subclass";
/// Name of the interface backend.
pub const INTERFACE: &str = "interface";
/// Name of the intercepting backend.
pub const INTERCEPTING: &str = "intercepting";

/// Kinds of target a backend can generate proxies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub interfaces: bool,
    pub classes: bool,
}

impl Capabilities {
    pub fn supports(&self, kind: TypeKind) -> bool {
        match kind {
            TypeKind::Interface => self.interfaces,
            TypeKind::Class => self.classes,
            TypeKind::Primitive => false,
        }
    }
}

/// A strategy for synthesizing proxy types.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Get the backend name, unique within a registry.
    fn name(&self) -> &str;

    /// Get the kinds of target this backend handles.
    fn capabilities(&self) -> Capabilities;

    /// Build a proxy type. Never returns a partially built type.
    fn generate(
        &self,
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
    ) -> Result<ProxyType, ProxyError>;
}

fn unsupported(backend: &str, target: &TargetType, reason: &str) -> ProxyError {
    ProxyError::UnsupportedTargetKind {
        type_name: target.name().to_string(),
        backend: backend.to_string(),
        reason: reason.to_string(),
    }
}

/// Reject targets that cannot be subclassed.
fn check_extendable(backend: &str, target: &TargetType) -> Result<(), ProxyError> {
    match target.kind() {
        TypeKind::Primitive => Err(unsupported(backend, target, "primitive types cannot be proxied")),
        _ if target.is_final() => Err(unsupported(backend, target, "final types cannot be extended")),
        _ if target.is_sealed() => Err(unsupported(backend, target, "sealed types cannot be extended")),
        _ => Ok(()),
    }
}

/// What an interface proxy does with abstract methods no rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbstractPolicy {
    LeaveAbstract,
    Stub,
}

static PROXY_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn proxy_name(backend: &str, target: &TargetType) -> String {
    let n = PROXY_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}$${}Proxy$${}", target.name(), backend, n)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Types reachable from `target`, each once, in lookup order.
fn hierarchy(target: &TargetType) -> Vec<TargetType> {
    fn walk(t: &TargetType, out: &mut Vec<TargetType>) {
        if out.contains(t) {
            return;
        }
        out.push(t.clone());
        if let Some(superclass) = t.superclass() {
            walk(superclass, out);
        }
        for interface in t.interfaces() {
            walk(interface, out);
        }
    }

    let mut out = Vec::new();
    walk(target, &mut out);
    out
}

/// Reject malformed method descriptors anywhere in the hierarchy.
fn validate(target: &TargetType) -> Result<(), ProxyError> {
    for t in hierarchy(target) {
        let mut declared: Vec<&MethodSignature> = Vec::new();
        for method in t.declared_methods() {
            let signature = &method.signature;
            if !is_identifier(&signature.name) {
                return Err(ProxyError::codegen(
                    target.name(),
                    format!("malformed method name '{}' in {}", signature.name, t.name()),
                ));
            }
            if signature.params.contains(&ValueType::Void) {
                return Err(ProxyError::codegen(
                    target.name(),
                    format!("void parameter in {}::{}", t.name(), signature),
                ));
            }
            if declared.contains(&signature) {
                return Err(ProxyError::codegen(
                    target.name(),
                    format!("duplicate method {}::{}", t.name(), signature),
                ));
            }
            declared.push(signature);
        }
    }
    Ok(())
}

fn bind_slot(rules: &RuleSet, method: &Arc<MethodDescriptor>, fallback: Slot) -> Slot {
    match rules.bind(method) {
        Some(rule) => Slot::Intercepted {
            rule,
            method: method.clone(),
        },
        None => fallback,
    }
}

/// Subclass emission: overridable methods may be intercepted, everything
/// else keeps its inherited behavior; constructors are copied.
fn emit_subclass(
    backend: &str,
    target: &TargetType,
    rules: &RuleSet,
    context: &LoadingContext,
) -> Result<ProxyType, ProxyError> {
    if target.kind() != TypeKind::Class {
        return Err(unsupported(backend, target, "a class is required"));
    }
    check_extendable(backend, target)?;
    validate(target)?;

    let name = proxy_name(backend, target);
    let mut table = DispatchTable::new(&name, rules.clone());
    for method in reflect::instance_methods(target).iter() {
        let inherited = if method.is_abstract() {
            Slot::Abstract { method: method.clone() }
        } else {
            Slot::Direct { method: method.clone() }
        };
        let slot = if reflect::can_override(method) {
            bind_slot(rules, method, inherited)
        } else {
            inherited
        };
        table.push(slot);
    }

    let mut constructors: Vec<Arc<ConstructorDescriptor>> = target
        .declared_constructors()
        .iter()
        .filter(|c| c.visibility != crate::core::Visibility::Private)
        .cloned()
        .collect();
    if target.declared_constructors().is_empty() {
        constructors.push(Arc::new(ConstructorDescriptor::no_args()));
    }
    if constructors.is_empty() {
        return Err(ProxyError::codegen(target.name(), "no accessible constructor to copy"));
    }

    finish(name, target, backend, context, table, constructors)
}

/// Interface emission: every method may be intercepted; a single no-arg
/// constructor is synthesized.
fn emit_interface(
    backend: &str,
    target: &TargetType,
    rules: &RuleSet,
    context: &LoadingContext,
    policy: AbstractPolicy,
) -> Result<ProxyType, ProxyError> {
    if target.kind() != TypeKind::Interface {
        return Err(unsupported(backend, target, "an interface is required"));
    }
    check_extendable(backend, target)?;
    validate(target)?;

    let name = proxy_name(backend, target);
    let mut table = DispatchTable::new(&name, rules.clone());
    for method in reflect::instance_methods(target).iter() {
        let fallback = match (method.is_abstract(), policy) {
            (false, _) => Slot::Direct { method: method.clone() },
            (true, AbstractPolicy::LeaveAbstract) => Slot::Abstract { method: method.clone() },
            (true, AbstractPolicy::Stub) => Slot::Unimplemented { method: method.clone() },
        };
        table.push(bind_slot(rules, method, fallback));
    }

    finish(name, target, backend, context, table, vec![Arc::new(ConstructorDescriptor::no_args())])
}

fn finish(
    name: String,
    target: &TargetType,
    backend: &str,
    context: &LoadingContext,
    table: DispatchTable,
    constructors: Vec<Arc<ConstructorDescriptor>>,
) -> Result<ProxyType, ProxyError> {
    let intercepted = table.slots().iter().filter(|s| s.is_intercepted()).count();
    if !table.is_instantiable() {
        warn_fmt!(
            "Backend",
            "{} leaves {} method(s) abstract; it cannot be instantiated",
            name,
            table.abstract_methods().len()
        );
    }
    debug_fmt!(
        "Backend",
        "generated {} for {} ({} of {} methods intercepted, context {})",
        name,
        target,
        intercepted,
        table.slots().len(),
        context.name()
    );
    Ok(ProxyType::new(name, target.clone(), backend, context.clone(), table, constructors))
}

/// Constructor signature every dynamic backend must implement
pub type BackendConstructor = fn() -> Arc<dyn Backend>;

static BACKEND_REGISTRY: Lazy<RwLock<HashMap<String, BackendConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a backend constructor so it can be named in configuration.
pub fn register_backend(name: &str, ctor: BackendConstructor) {
    BACKEND_REGISTRY.write().insert(name.to_string(), ctor);
}

fn get_registered_backend(name: &str) -> Option<BackendConstructor> {
    BACKEND_REGISTRY.read().get(name).copied()
}

/// Factory for creating backends by name.
#[derive(Debug)]
pub struct BackendFactory;

impl BackendFactory {
    pub fn create_backend(name: &str) -> Result<Arc<dyn Backend>, ProxyError> {
        if let Some(ctor) = get_registered_backend(name) {
            return Ok(ctor());
        }

        match name {
            INTERCEPTING => Ok(Arc::new(InterceptingBackend)),
            SUBCLASS => Ok(Arc::new(SubclassBackend)),
            INTERFACE => Ok(Arc::new(InterfaceBackend)),
            _ => Err(ProxyError::UnknownBackend(name.to_string())),
        }
    }
}

/// Priority-ordered list of backends.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `intercepting`, `subclass`, `interface`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(InterceptingBackend));
        registry.register(Arc::new(SubclassBackend));
        registry.register(Arc::new(InterfaceBackend));
        registry
    }

    /// Build a registry from backend names, highest priority first.
    pub fn from_names(names: &[String]) -> Result<Self, ProxyError> {
        let mut registry = Self::new();
        for name in names {
            registry.register(BackendFactory::create_backend(name)?);
        }
        Ok(registry)
    }

    /// Append a backend at the lowest priority. A backend with the same name
    /// is replaced in place.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        match self.backends.iter().position(|b| b.name() == backend.name()) {
            Some(idx) => self.backends[idx] = backend,
            None => self.backends.push(backend),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Pick the backend for `target`. A pinned name always wins; otherwise
    /// the first backend (by priority) able to handle the target's kind.
    pub fn resolve(&self, target: &TargetType, pinned: Option<&str>) -> Result<Arc<dyn Backend>, ProxyError> {
        if let Some(name) = pinned {
            return self
                .get(name)
                .cloned()
                .ok_or_else(|| ProxyError::UnknownBackend(name.to_string()));
        }

        let kind = target.kind();
        self.backends
            .iter()
            .find(|b| b.capabilities().supports(kind))
            .cloned()
            .ok_or_else(|| {
                unsupported(
                    "auto",
                    target,
                    &format!("no registered backend handles {kind} targets"),
                )
            })
    }
}
