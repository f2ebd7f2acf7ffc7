// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generated proxy types and the handles callers instantiate them through.

use std::sync::Arc;
use uuid::Uuid;

use super::dispatch::DispatchTable;
use super::instance::{construct, Instance};
use crate::cache::LoadingContext;
use crate::core::{ConstructorDescriptor, ProxyError, TargetType, Value, ValueType};
use crate::reflect;
use crate::rules::RuleSet;
use crate::loader::Surrogate;
use crate::debug_fmt;

/// A synthesized type. Immutable once built; shared by every handle and
/// instance referring to it.
#[derive(Debug)]
pub struct ProxyType {
    id: Uuid,
    name: String,
    target: TargetType,
    backend: String,
    context: LoadingContext,
    table: Arc<DispatchTable>,
    constructors: Vec<Arc<ConstructorDescriptor>>,
}

impl ProxyType {
    pub(crate) fn new(
        name: String,
        target: TargetType,
        backend: &str,
        context: LoadingContext,
        table: DispatchTable,
        constructors: Vec<Arc<ConstructorDescriptor>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            target,
            backend: backend.to_string(),
            context,
            table: Arc::new(table),
            constructors,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn context(&self) -> &LoadingContext {
        &self.context
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn rules(&self) -> &RuleSet {
        self.table.rules()
    }

    pub fn constructors(&self) -> &[Arc<ConstructorDescriptor>] {
        &self.constructors
    }

    /// Returns false while some method is left without behavior.
    pub fn is_instantiable(&self) -> bool {
        self.table.is_instantiable()
    }

    fn instantiate(
        &self,
        constructor: Option<&Arc<ConstructorDescriptor>>,
        args: &[Value],
    ) -> Result<Instance, ProxyError> {
        if !self.is_instantiable() {
            let missing: Vec<String> =
                self.table.abstract_methods().iter().map(|s| s.to_string()).collect();
            let err = ProxyError::construction(
                &self.name,
                format!("abstract methods without behavior: {}", missing.join(", ")),
            );
            debug_fmt!("ProxyClass", "{}", err);
            return Err(err);
        }

        let constructor = constructor.ok_or_else(|| {
            let shape: Vec<String> = args.iter().map(|a| ValueType::of(a).to_string()).collect();
            ProxyError::construction(
                &self.name,
                format!("no constructor accepts ({})", shape.join(", ")),
            )
        })?;

        construct(&self.table, constructor, args, true)
    }
}

/// Public handle to a generated proxy type.
#[derive(Debug, Clone)]
pub struct ProxyClass {
    proxy_type: Arc<ProxyType>,
}

impl ProxyClass {
    pub(crate) fn new(proxy_type: Arc<ProxyType>) -> Self {
        Self { proxy_type }
    }

    /// Generate (or reuse) a proxy type with the process-wide engine.
    ///
    /// `backend` pins a backend by name; `None` applies the default
    /// resolution order.
    pub fn new_proxy_class(
        target: &TargetType,
        rules: &RuleSet,
        context: &LoadingContext,
        backend: Option<&str>,
    ) -> Result<Self, ProxyError> {
        Surrogate::global().proxy_class_with(target, rules, context, backend)
    }

    /// Create an instance with the first constructor accepting `args`.
    pub fn new_instance(&self, args: &[Value]) -> Result<Instance, ProxyError> {
        let constructor = reflect::find_constructor(&self.proxy_type.constructors, args);
        self.proxy_type.instantiate(constructor, args)
    }

    /// Create an instance with the constructor declared with `params`.
    pub fn new_instance_with(&self, params: &[ValueType], args: &[Value]) -> Result<Instance, ProxyError> {
        let constructor = reflect::find_constructor_exact(&self.proxy_type.constructors, params);
        if let Some(c) = constructor {
            if !c.accepts(args) {
                return Err(ProxyError::construction(
                    &self.proxy_type.name,
                    "arguments do not fit the requested constructor",
                ));
            }
        }
        self.proxy_type.instantiate(constructor, args)
    }

    /// Name of the backend that generated the type.
    pub fn backend_used(&self) -> &str {
        self.proxy_type.backend()
    }

    pub fn name(&self) -> &str {
        self.proxy_type.name()
    }

    pub fn target(&self) -> &TargetType {
        self.proxy_type.target()
    }

    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.proxy_type
    }
}
